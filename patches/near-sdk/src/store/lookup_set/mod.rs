mod impls;

use crate::store::key::{Identity, ToKey};
use crate::{env, IntoStorageKey, StableMap};
use borsh::{BorshDeserialize, BorshSerialize};
use once_cell::unsync::OnceCell;
use std::borrow::Borrow;
use std::fmt;
use std::marker::PhantomData;

#[derive(BorshSerialize, BorshDeserialize)]
pub struct LookupSet<T, H = Identity>
where
    T: BorshSerialize + Ord,
    H: ToKey,
{
    prefix: Box<[u8]>,

    /// Cache that keeps track the state of elements in the underlying set.
    #[borsh_skip]
    cache: StableMap<T, OnceCell<EntryState>>,

    #[borsh_skip]
    hasher: PhantomData<H>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum EntryState {
    /// The element is cached as freshly inserted, but not necessarily absent from the trie
    Inserted,
    /// The element is cached as freshly deleted, but not necessarily present on the trie
    Deleted,
    /// The element is definitely present on the trie
    Present,
    /// The element is definitely absent from the trie
    Absent,
}

impl<T, H> Drop for LookupSet<T, H>
where
    T: BorshSerialize + Ord,
    H: ToKey,
{
    fn drop(&mut self) {
        self.flush()
    }
}

impl<T, H> fmt::Debug for LookupSet<T, H>
where
    T: BorshSerialize + Ord,
    H: ToKey,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookupSet").field("prefix", &self.prefix).finish()
    }
}

impl<T> LookupSet<T, Identity>
where
    T: BorshSerialize + Ord,
{
    #[inline]
    pub fn new<S>(prefix: S) -> Self
    where
        S: IntoStorageKey,
    {
        Self::with_hasher(prefix)
    }
}

impl<T, H> LookupSet<T, H>
where
    T: BorshSerialize + Ord,
    H: ToKey,
{
    fn contains_trie_element<Q: ?Sized>(prefix: &[u8], value: &Q) -> bool
    where
        Q: BorshSerialize,
        T: Borrow<Q>,
    {
        let lookup_key = H::to_key(prefix, value, &mut Vec::new());
        env::storage_has_key(lookup_key.as_ref())
    }

    fn get_mut_inner<Q: ?Sized>(&mut self, value: &Q) -> &mut EntryState
    where
        T: Borrow<Q>,
        Q: BorshSerialize + ToOwned<Owned = T>,
    {
        let prefix = &self.prefix;
        //* ToOwned bound, which forces a clone, is required to be able to keep the value in the cache
        let entry = self.cache.get_mut(value.to_owned());
        entry.get_or_init(|| {
            if Self::contains_trie_element(prefix, value) {
                EntryState::Present
            } else {
                EntryState::Absent
            }
        });
        let entry = entry.get_mut().unwrap_or_else(|| env::abort());
        entry
    }

    /// Initialize a [`LookupSet`] with a custom hash function.
    ///
    /// # Example
    /// ```
    /// use near_sdk::store::{LookupSet, key::Keccak256};
    ///
    /// let map = LookupSet::<String, Keccak256>::with_hasher(b"m");
    /// ```
    pub fn with_hasher<S>(prefix: S) -> Self
    where
        S: IntoStorageKey,
    {
        Self {
            prefix: prefix.into_storage_key().into_boxed_slice(),
            cache: Default::default(),
            hasher: Default::default(),
        }
    }

    /// Returns `true` if the set contains the specified value.
    ///
    /// The value may be any borrowed form of the set's value type, but
    /// [`BorshSerialize`], [`ToOwned<Owned = T>`](ToOwned) and [`Ord`] on the borrowed form *must*
    /// match those for the value type.
    pub fn contains<Q: ?Sized>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: BorshSerialize + ToOwned<Owned = T> + Ord,
    {
        let entry_cell = self.cache.get(value.to_owned());
        match entry_cell.get_or_init(|| {
            let lookup_key = H::to_key(&self.prefix, value, &mut Vec::new());
            let contains = env::storage_has_key(lookup_key.as_ref());
            if contains {
                EntryState::Present
            } else {
                EntryState::Absent
            }
        }) {
            EntryState::Inserted | EntryState::Present => true,
            EntryState::Deleted | EntryState::Absent => false,
        }
    }

    /// Adds a value to the set.
    ///
    /// If the set did not have this value present, true is returned.
    ///
    /// If the set did have this value present, false is returned.
    pub fn insert(&mut self, value: T) -> bool
    where
        T: Clone,
    {
        let entry = self.get_mut_inner(&value);
        match entry {
            EntryState::Inserted | EntryState::Present => false,
            EntryState::Deleted | EntryState::Absent => {
                *entry = EntryState::Inserted;
                true
            }
        }
    }

    /// Puts the given value into the set.
    ///
    /// This function will not return whether the passed value was already in the set.
    /// Use [`LookupSet::insert`] if you need that.
    pub fn put(&mut self, value: T) {
        let entry_cell = self.cache.get_mut(value);
        // It is safe to preemptively mark an entry as `Inserted` even if it is already present on
        // trie; it just means we will invoke `env::storage_write` one more time than strictly
        // necessary.
        entry_cell.get_or_init(|| EntryState::Inserted);
        let entry = entry_cell.get_mut().unwrap_or_else(|| env::abort());
        match entry {
            EntryState::Inserted | EntryState::Present => {}
            EntryState::Deleted | EntryState::Absent => *entry = EntryState::Inserted,
        }
    }

    /// Removes a value from the set. Returns whether the value was present in the set.
    ///
    /// The value may be any borrowed form of the set's value type, but
    /// [`BorshSerialize`], [`ToOwned<Owned = K>`](ToOwned) and [`Ord`] on the borrowed form *must*
    /// match those for the value type.
    pub fn remove<Q: ?Sized>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: BorshSerialize + ToOwned<Owned = T> + Ord,
    {
        let entry = self.get_mut_inner(value);
        match entry {
            EntryState::Present | EntryState::Inserted => {
                *entry = EntryState::Deleted;
                true
            }
            EntryState::Deleted | EntryState::Absent => false,
        }
    }
}

impl<T, H> LookupSet<T, H>
where
    T: BorshSerialize + Ord,
    H: ToKey,
{
    /// Flushes the intermediate values of the set before this is called when the structure is
    /// [`Drop`]ed. This will write all modified values to storage but keep all cached values
    /// in memory.
    pub fn flush(&mut self) {
        let mut buf = Vec::new();
        for (k, v) in self.cache.inner().iter_mut() {
            if let Some(entry) = v.get_mut() {
                match entry {
                    EntryState::Inserted => {
                        buf.clear();
                        let lookup_key = H::to_key(&self.prefix, k, &mut buf);
                        env::storage_write(lookup_key.as_ref(), &[]);
                        *entry = EntryState::Present;
                    }
                    EntryState::Deleted => {
                        buf.clear();
                        let lookup_key = H::to_key(&self.prefix, k, &mut buf);
                        env::storage_remove(lookup_key.as_ref());
                        *entry = EntryState::Absent;
                    }
                    EntryState::Present | EntryState::Absent => {}
                }
            }
        }
    }
}
