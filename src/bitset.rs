use std::fmt;
use std::mem;
use std::rc::Rc;

use tracing::trace;

use crate::accounting::Accounting;
use crate::block::{Block, BLOCK_CAPACITY};
use crate::error::{Error, Result};

/// One block position of a bitset
#[derive(Clone, Debug)]
enum Slot {
    /// Every bit in the block's range is 0
    Empty,

    /// A reference to a block, possibly shared with other slots
    Owned(Rc<Block>),
}

impl Slot {
    /// Get the block of the slot if one is present
    #[inline]
    fn block(&self) -> Option<&Rc<Block>> {
        match self {
            Slot::Empty => None,
            Slot::Owned(block) => Some(block),
        }
    }

    #[inline]
    fn cardinality(&self) -> usize {
        self.block().map_or(0, |block| block.cardinality())
    }

    /// Check if the slot holds a block that another slot also holds
    #[inline]
    fn is_shared(&self) -> bool {
        self.block().map_or(false, |block| Rc::strong_count(block) > 1)
    }

    /// Install a fresh block with every bit cleared and return it
    ///
    /// The caller is responsible for charging the allocation.
    fn materialize(&mut self, slot: usize) -> &mut Rc<Block> {
        if let Slot::Empty = self {
            trace!(slot = slot, "materializing empty block");
            *self = Slot::Owned(Rc::new(Block::zeroed()));
        }

        match self {
            Slot::Owned(block) => block,
            Slot::Empty => unreachable!("slot {} was just materialized", slot),
        }
    }

    /// Release the block if it no longer holds any set bits
    #[inline]
    fn release_if_empty(&mut self) {
        if self.cardinality() == 0 {
            *self = Slot::Empty;
        }
    }
}

/// Get write access to a block, copying it first if another slot holds it as well
///
/// Copies must already be charged to the accounting of the bitset being written.
fn make_private(block: &mut Rc<Block>, slot: usize) -> &mut Block {
    if Rc::strong_count(block) > 1 {
        trace!(slot = slot, "copying shared block before write");
    }

    Rc::make_mut(block)
}

/// Check if writing `ours` with the contents of `theirs` requires a private copy of `ours`
#[inline]
fn needs_copy(ours: &Slot, theirs: &Slot) -> bool {
    match (ours, theirs) {
        (Slot::Owned(a), Slot::Owned(b)) => !Rc::ptr_eq(a, b) && Rc::strong_count(a) > 1,
        _ => false,
    }
}

/// Get the number of slots required to cover `bit_capacity` bits
#[inline]
fn slot_count(bit_capacity: usize) -> usize {
    bit_capacity / BLOCK_CAPACITY + (bit_capacity % BLOCK_CAPACITY != 0) as usize
}

/// A fixed size set of bits with copy-on-write block sharing
///
/// # How it works
/// The bits are split into blocks of `BLOCK_CAPACITY` bits. Each slot of the bitset is either
/// empty, meaning every bit in its range is 0, or holds a reference counted block. Duplicating
/// a bitset only copies the slot references, so a duplicate costs one pointer per block no
/// matter how many bits are set. A shared block is copied the first time either holder writes
/// to it.
///
/// A block that loses its last set bit is released, so an empty slot is the only representation
/// of an all-zero range. Bits past `bit_capacity` in the last block are always 0.
///
/// # Performance Remarks
/// Operations that cannot change a block (setting a bit that is already set, clearing one that
/// is already clear, combining a slot with itself) never copy it. Union into an empty slot
/// shares the other operand's block instead of copying it.
///
/// Bitsets are not thread safe. Bitsets that share blocks must be used from one thread.
pub struct Bitset {
    /// The number of addressable bits
    bit_capacity: usize,

    /// One slot per block covering the bits
    slots: Vec<Slot>,

    /// Where block and slot allocations are recorded
    accounting: Accounting,
}

impl Bitset {
    /// Create an empty bitset with `bit_capacity` addressable bits
    ///
    /// Allocations are recorded against the thread's default accounting.
    #[inline]
    pub fn new(bit_capacity: usize) -> Result<Self> {
        Self::with_accounting(bit_capacity, Accounting::thread_default())
    }

    /// Create an empty bitset that records its allocations against `accounting`
    pub fn with_accounting(bit_capacity: usize, accounting: Accounting) -> Result<Self> {
        let count = slot_count(bit_capacity);
        let mut slots = allocate_slots(&accounting, count)?;
        slots.resize(count, Slot::Empty);

        Ok(Self {
            bit_capacity,
            slots,
            accounting,
        })
    }

    /// Create a new bitset with the same contents
    ///
    /// Blocks are shared with `self` rather than copied. The duplicate uses the same accounting.
    pub fn duplicate(&self) -> Result<Self> {
        let mut slots = allocate_slots(&self.accounting, self.slots.len())?;
        slots.extend(self.slots.iter().cloned());

        Ok(Self {
            bit_capacity: self.bit_capacity,
            slots,
            accounting: self.accounting.clone(),
        })
    }

    /// The number of addressable bits
    #[inline]
    pub fn bit_capacity(&self) -> usize {
        self.bit_capacity
    }

    /// Get the number of set bits
    pub fn cardinality(&self) -> usize {
        self.slots.iter().map(Slot::cardinality).sum()
    }

    /// Get the number of set bits
    ///
    /// This is the same as cardinality
    #[inline]
    pub fn len(&self) -> usize {
        self.cardinality()
    }

    /// Check if no bits are set
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.block().is_none())
    }

    /// The number of block slots covering the bits
    #[inline]
    pub fn block_count(&self) -> usize {
        self.slots.len()
    }

    /// The number of slots currently holding a block
    pub fn allocated_blocks(&self) -> usize {
        self.slots.iter().filter(|slot| slot.block().is_some()).count()
    }

    /// The number of slots holding a block that is also held elsewhere
    pub fn shared_blocks(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_shared()).count()
    }

    /// The accounting this bitset records its allocations against
    #[inline]
    pub fn accounting(&self) -> &Accounting {
        &self.accounting
    }

    /// Get the value of the bit at `index`
    pub fn test(&self, index: usize) -> Result<bool> {
        let (slot, bit) = self.locate(index)?;

        Ok(self.test_in_slot(slot, bit))
    }

    /// Set the bit at `index` to 1
    pub fn set(&mut self, index: usize) -> Result<()> {
        let (slot, bit) = self.locate(index)?;

        if self.test_in_slot(slot, bit) {
            return Ok(());
        }

        self.writable_block(slot)?.insert(bit);

        Ok(())
    }

    /// Set the bit at `index` to 0
    pub fn clear(&mut self, index: usize) -> Result<()> {
        let (slot, bit) = self.locate(index)?;

        if !self.test_in_slot(slot, bit) {
            return Ok(());
        }

        // Clearing the last set bit releases the block, no need to write to it first
        if self.slots[slot].cardinality() == 1 {
            self.slots[slot] = Slot::Empty;
            return Ok(());
        }

        self.writable_block(slot)?.remove(bit);

        Ok(())
    }

    /// Flip the bit at `index` and return its new value
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        let (slot, bit) = self.locate(index)?;

        if self.test_in_slot(slot, bit) && self.slots[slot].cardinality() == 1 {
            self.slots[slot] = Slot::Empty;
            return Ok(false);
        }

        Ok(self.writable_block(slot)?.toggle(bit))
    }

    /// Union `other` into this bitset
    ///
    /// Fails without modifying either bitset if the capacities differ or the copies
    /// of shared blocks cannot be allocated.
    pub fn union_with(&mut self, other: &Bitset) -> Result<()> {
        self.prepare_combine(other)?;

        let pass = self.slots.iter_mut()
            .zip(other.slots.iter())
            .enumerate();

        for (index, (ours, theirs)) in pass {
            let theirs = match theirs {
                Slot::Empty => continue,
                Slot::Owned(block) => block,
            };

            match ours {
                Slot::Empty => *ours = Slot::Owned(Rc::clone(theirs)),
                Slot::Owned(block) => {
                    if !Rc::ptr_eq(block, theirs) {
                        make_private(block, index).union_with(theirs);
                    }
                }
            }
        }

        Ok(())
    }

    /// Intersect this bitset with `other`
    ///
    /// Fails without modifying either bitset if the capacities differ or the copies
    /// of shared blocks cannot be allocated.
    pub fn intersect_with(&mut self, other: &Bitset) -> Result<()> {
        self.prepare_combine(other)?;

        let pass = self.slots.iter_mut()
            .zip(other.slots.iter())
            .enumerate();

        for (index, (ours, theirs)) in pass {
            let theirs = match theirs {
                Slot::Empty => {
                    *ours = Slot::Empty;
                    continue;
                },
                Slot::Owned(block) => block,
            };

            if let Slot::Owned(block) = ours {
                if !Rc::ptr_eq(block, theirs) {
                    make_private(block, index).intersect_with(theirs);
                }
            }

            ours.release_if_empty();
        }

        Ok(())
    }

    /// Remove the bits of `other` from this bitset
    ///
    /// Fails without modifying either bitset if the capacities differ or the copies
    /// of shared blocks cannot be allocated.
    pub fn difference_with(&mut self, other: &Bitset) -> Result<()> {
        self.prepare_combine(other)?;

        let pass = self.slots.iter_mut()
            .zip(other.slots.iter())
            .enumerate();

        for (index, (ours, theirs)) in pass {
            let theirs = match theirs {
                Slot::Empty => continue,
                Slot::Owned(block) => block,
            };

            if let Slot::Owned(block) = ours {
                if Rc::ptr_eq(block, theirs) {
                    *ours = Slot::Empty;
                    continue;
                }

                make_private(block, index).difference_with(theirs);
            }

            ours.release_if_empty();
        }

        Ok(())
    }

    /// Flip every bit of this bitset
    ///
    /// Fails without modifying the bitset if the new blocks cannot be allocated.
    pub fn invert(&mut self) -> Result<()> {
        let required = (0..self.slots.len())
            .filter(|slot| match &self.slots[*slot] {
                Slot::Empty => true,
                Slot::Owned(block) => Rc::strong_count(block) > 1 && !block.is_full(self.domain(*slot)),
            })
            .count();

        self.charge_blocks(required)?;

        for index in 0..self.slots.len() {
            let domain = self.domain(index);
            let slot = &mut self.slots[index];

            match slot {
                Slot::Empty => {
                    trace!(slot = index, "materializing full block");
                    *slot = Slot::Owned(Rc::new(Block::full(domain)));
                },
                Slot::Owned(block) => {
                    if block.is_full(domain) {
                        *slot = Slot::Empty;
                    }
                    else {
                        make_private(block, index).invert(domain);
                    }
                }
            }
        }

        Ok(())
    }

    /// Compute the union of `self` and `other` and return it as a new bitset
    pub fn union(&self, other: &Bitset) -> Result<Bitset> {
        self.check_capacity(other)?;

        let mut result = self.duplicate()?;
        result.union_with(other)?;

        Ok(result)
    }

    /// Compute the intersection of `self` and `other` and return it as a new bitset
    pub fn intersection(&self, other: &Bitset) -> Result<Bitset> {
        self.check_capacity(other)?;

        let mut result = self.duplicate()?;
        result.intersect_with(other)?;

        Ok(result)
    }

    /// Compute `self - other` and return it as a new bitset
    pub fn difference(&self, other: &Bitset) -> Result<Bitset> {
        self.check_capacity(other)?;

        let mut result = self.duplicate()?;
        result.difference_with(other)?;

        Ok(result)
    }

    /// Compute the complement of `self` and return it as a new bitset
    pub fn complement(&self) -> Result<Bitset> {
        let mut result = self.duplicate()?;
        result.invert()?;

        Ok(result)
    }

    /// Split `index` into a slot index and a bit index within that slot's block
    #[inline]
    fn locate(&self, index: usize) -> Result<(usize, usize)> {
        if index >= self.bit_capacity {
            return Err(Error::IndexOutOfRange {
                index,
                bit_capacity: self.bit_capacity,
            });
        }

        Ok((index / BLOCK_CAPACITY, index % BLOCK_CAPACITY))
    }

    #[inline]
    fn test_in_slot(&self, slot: usize, bit: usize) -> bool {
        self.slots[slot].block().map_or(false, |block| block.contains(bit))
    }

    /// The number of logical bits covered by the slot at `slot`
    #[inline]
    fn domain(&self, slot: usize) -> usize {
        (self.bit_capacity - slot * BLOCK_CAPACITY).min(BLOCK_CAPACITY)
    }

    /// Get write access to the block at `slot`, materializing or copying it as needed
    fn writable_block(&mut self, slot: usize) -> Result<&mut Block> {
        if !matches!(self.slots[slot], Slot::Owned(ref block) if Rc::strong_count(block) == 1) {
            self.charge_blocks(1)?;
        }

        let block = self.slots[slot].materialize(slot);

        Ok(make_private(block, slot))
    }

    fn check_capacity(&self, other: &Bitset) -> Result<()> {
        if self.bit_capacity != other.bit_capacity {
            return Err(Error::CapacityMismatch {
                left: self.bit_capacity,
                right: other.bit_capacity,
            });
        }

        // The slot counts are computed from the capacities
        assert_eq!(self.slots.len(), other.slots.len());

        Ok(())
    }

    /// Validate a binary operation and charge the copies it will make
    fn prepare_combine(&self, other: &Bitset) -> Result<()> {
        self.check_capacity(other)?;

        let required = self.slots.iter()
            .zip(other.slots.iter())
            .filter(|(ours, theirs)| needs_copy(ours, theirs))
            .count();

        self.charge_blocks(required)
    }

    fn charge_blocks(&self, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }

        let bytes = count.saturating_mul(Block::allocation_size());
        self.accounting.charge(count, bytes)
    }

    /// Check every block and the canonical form of every slot
    #[cfg(test)]
    pub(crate) fn assert_valid(&self) {
        assert_eq!(self.slots.len(), slot_count(self.bit_capacity));

        for (index, slot) in self.slots.iter().enumerate() {
            if let Slot::Owned(block) = slot {
                block.assert_valid(self.domain(index));
                assert!(block.cardinality() > 0, "slot {} holds an empty block", index);
            }
        }
    }
}

/// Reserve and charge storage for `count` slots
fn allocate_slots(accounting: &Accounting, count: usize) -> Result<Vec<Slot>> {
    let bytes = count
        .checked_mul(mem::size_of::<Slot>())
        .ok_or(Error::SlotAllocation { slots: count })?;

    let mut slots = Vec::new();
    slots
        .try_reserve_exact(count)
        .map_err(|_| Error::SlotAllocation { slots: count })?;

    accounting.charge(1, bytes)?;

    Ok(slots)
}

impl PartialEq for Bitset {
    fn eq(&self, other: &Bitset) -> bool {
        if self.bit_capacity != other.bit_capacity {
            return false;
        }

        self.slots.iter()
            .zip(other.slots.iter())
            .all(|pair| match pair {
                (Slot::Empty, Slot::Empty) => true,
                (Slot::Owned(a), Slot::Owned(b)) => Rc::ptr_eq(a, b) || a.words() == b.words(),
                (Slot::Empty, Slot::Owned(block)) | (Slot::Owned(block), Slot::Empty) => {
                    block.cardinality() == 0
                },
            })
    }
}

impl Eq for Bitset {}

impl fmt::Debug for Bitset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitset")
            .field("bit_capacity", &self.bit_capacity)
            .field("cardinality", &self.cardinality())
            .field("blocks", &self.slots.len())
            .field("allocated", &self.allocated_blocks())
            .field("shared", &self.shared_blocks())
            .finish()
    }
}
