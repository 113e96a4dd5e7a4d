//! Field arrays: dynamic lists of entries with stable identities.
//!
//! Each entry carries an [`EntryId`] that follows it through insertions,
//! removals, swaps and moves. Errors, touched flags and registered rules of
//! the entries are re-keyed alongside, so `phNumbers.2.number` always
//! refers to whatever entry now sits at index 2.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::{FormError, Result};
use crate::field::FieldOptions;
use crate::form::{Change, Form};
use crate::path::{reindex_keys, FieldPath, IntoFieldPath};
use crate::value::FieldValue;

/// Stable identity of a field array entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of a field array, as listed by [`FieldArray::fields`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayFieldEntry {
    /// Stable identity.
    pub id: EntryId,
    /// Current position.
    pub index: usize,
    /// Current value.
    pub value: FieldValue,
}

/// Rules registered for every entry of a field array.
///
/// ```
/// use formstate::{ArrayTemplate, FieldOptions};
///
/// let phones = ArrayTemplate::new()
///     .item_field("number", FieldOptions::new().required("Phone number is required"))
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ArrayTemplate {
    items: Vec<(Option<FieldPath>, FieldOptions)>,
}

impl ArrayTemplate {
    /// Creates an empty template.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers each entry itself with `options`.
    #[must_use]
    pub fn item(mut self, options: FieldOptions) -> Self {
        self.items.push((None, options));
        self
    }

    /// Registers `relative` inside each entry with `options`.
    pub fn item_field(mut self, relative: impl IntoFieldPath, options: FieldOptions) -> Result<Self> {
        self.items.push((Some(relative.into_field_path()?), options));
        Ok(self)
    }

    fn paths_for<'a>(
        &'a self,
        entry: &'a FieldPath,
    ) -> impl Iterator<Item = (FieldPath, &'a FieldOptions)> + 'a {
        self.items.iter().map(move |(relative, options)| {
            let path = match relative {
                Some(relative) => entry.join(relative),
                None => entry.clone(),
            };
            (path, options)
        })
    }
}

#[derive(Debug)]
struct ArrayState {
    ids: Vec<EntryId>,
    template: ArrayTemplate,
}

/// Tracked arrays, keyed by path.
#[derive(Debug, Default)]
pub(crate) struct FieldArrays {
    arrays: BTreeMap<FieldPath, ArrayState>,
}

impl FieldArrays {
    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.arrays.keys()
    }

    /// Re-keys arrays nested inside entries of `array`.
    pub fn reindex(&mut self, array: &FieldPath, reindex: &dyn Fn(usize) -> Option<usize>) {
        reindex_keys(&mut self.arrays, array, reindex);
    }
}

impl Form {
    /// Returns a handle for editing the list at `path`.
    ///
    /// The path is tracked as a field array from then on. A missing or
    /// `Null` value counts as an empty list.
    pub fn field_array(&mut self, path: impl IntoFieldPath) -> Result<FieldArray<'_>> {
        let path = path.into_field_path()?;
        if !self.arrays.arrays.contains_key(&path) {
            self.register_array(&path, ArrayTemplate::new())?;
        }
        Ok(FieldArray { form: self, path })
    }

    /// Tracks the list at `path` and registers `template` for every entry,
    /// present and future. Re-registering replaces the template.
    pub fn register_array(&mut self, path: impl IntoFieldPath, template: ArrayTemplate) -> Result<()> {
        let path = path.into_field_path()?;
        match self.values.get(&path) {
            None | Some(FieldValue::Null | FieldValue::List(_)) => {}
            Some(_) => return Err(FormError::NotAnArray(path)),
        }

        match self.arrays.arrays.get_mut(&path) {
            Some(state) => state.template = template,
            None => {
                self.arrays.arrays.insert(
                    path.clone(),
                    ArrayState {
                        ids: Vec::new(),
                        template,
                    },
                );
            }
        }
        self.sync_array(&path, false);
        self.refresh_disabled();
        debug!(%path, "registered field array");
        Ok(())
    }

    /// Brings every tracked array's ids and entry registrations in line
    /// with the value tree. With `regenerate`, every entry gets a new id.
    pub(crate) fn sync_arrays(&mut self, regenerate: bool) {
        let paths: Vec<FieldPath> = self.arrays.paths().cloned().collect();
        for path in paths {
            self.sync_array(&path, regenerate);
        }
    }

    fn sync_array(&mut self, path: &FieldPath, regenerate: bool) {
        let len = self
            .values
            .get(path)
            .and_then(FieldValue::as_list)
            .map_or(0, <[FieldValue]>::len);

        let Some(state) = self.arrays.arrays.get_mut(path) else {
            return;
        };
        if regenerate {
            state.ids.clear();
        }
        state.ids.truncate(len);
        while state.ids.len() < len {
            state.ids.push(EntryId::new());
        }

        for index in 0..len {
            let entry = path.index(index);
            for (field, options) in state.template.paths_for(&entry) {
                if !self.registry.contains(&field) {
                    let dirty = self.values.get_or_null(&field) != self.defaults.get_or_null(&field);
                    self.registry.register(field.clone(), options.clone());
                    if let Some(registered) = self.registry.get_mut(&field) {
                        registered.dirty = dirty;
                    }
                }
            }
        }

        let beyond = |p: &FieldPath| p.index_under(path).is_some_and(|i| i >= len);
        self.registry.retain(|p| !beyond(p));
        self.errors.retain(|p| !beyond(p));
        self.arrays.arrays.retain(|p, _| !beyond(p));
    }
}

/// Editing handle for one field array.
///
/// Every operation is a single mutation batch: it bumps the form revision
/// once and notifies watchers of the array path.
pub struct FieldArray<'a> {
    form: &'a mut Form,
    path: FieldPath,
}

impl std::fmt::Debug for FieldArray<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldArray")
            .field("path", &self.path)
            .field("len", &self.len())
            .finish()
    }
}

impl FieldArray<'_> {
    /// Returns the array path.
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.ids().len()
    }

    /// Returns whether the array has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lists entries with their ids, in order.
    pub fn fields(&self) -> Vec<ArrayFieldEntry> {
        let items = self
            .form
            .values
            .get(&self.path)
            .and_then(FieldValue::as_list)
            .unwrap_or_default();
        self.ids()
            .iter()
            .zip(items)
            .enumerate()
            .map(|(index, (id, value))| ArrayFieldEntry {
                id: *id,
                index,
                value: value.clone(),
            })
            .collect()
    }

    /// Adds an entry at the end.
    pub fn append(&mut self, value: impl Into<FieldValue>) -> Result<EntryId> {
        let len = self.len();
        self.insert(len, value)
    }

    /// Adds an entry at the start.
    pub fn prepend(&mut self, value: impl Into<FieldValue>) -> Result<EntryId> {
        self.insert(0, value)
    }

    /// Inserts an entry at `index`, shifting later entries right.
    pub fn insert(&mut self, index: usize, value: impl Into<FieldValue>) -> Result<EntryId> {
        self.check_bounds(index, self.len() + 1)?;
        let value = value.into();
        let id = EntryId::new();
        self.edit(
            "insert",
            |items, ids| {
                items.insert(index, value);
                ids.insert(index, id);
            },
            &|i| Some(if i >= index { i + 1 } else { i }),
        )?;
        Ok(id)
    }

    /// Removes the entry at `index`, shifting later entries left. Its
    /// error and metadata go with it.
    pub fn remove(&mut self, index: usize) -> Result<ArrayFieldEntry> {
        self.check_bounds(index, self.len())?;
        let (id, value) = self.edit(
            "remove",
            |items, ids| (ids.remove(index), items.remove(index)),
            &|i| match i.cmp(&index) {
                std::cmp::Ordering::Less => Some(i),
                std::cmp::Ordering::Equal => None,
                std::cmp::Ordering::Greater => Some(i - 1),
            },
        )?;
        Ok(ArrayFieldEntry { id, index, value })
    }

    /// Exchanges two entries.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        let len = self.len();
        self.check_bounds(a, len)?;
        self.check_bounds(b, len)?;
        self.edit(
            "swap",
            |items, ids| {
                items.swap(a, b);
                ids.swap(a, b);
            },
            &|i| {
                Some(if i == a {
                    b
                } else if i == b {
                    a
                } else {
                    i
                })
            },
        )
    }

    /// Moves the entry at `from` to `to`, shifting the entries between.
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.len();
        self.check_bounds(from, len)?;
        self.check_bounds(to, len)?;
        self.edit(
            "move",
            |items, ids| {
                let item = items.remove(from);
                items.insert(to, item);
                let id = ids.remove(from);
                ids.insert(to, id);
            },
            &|i| {
                Some(if i == from {
                    to
                } else if from < to && i > from && i <= to {
                    i - 1
                } else if to < from && i >= to && i < from {
                    i + 1
                } else {
                    i
                })
            },
        )
    }

    /// Replaces every entry. All entries get new ids; errors and metadata
    /// of the old entries are dropped.
    pub fn replace(&mut self, values: Vec<FieldValue>) -> Result<Vec<EntryId>> {
        let new_ids: Vec<EntryId> = values.iter().map(|_| EntryId::new()).collect();
        let assigned = new_ids.clone();
        self.edit(
            "replace",
            |items, ids| {
                *items = values;
                *ids = new_ids;
            },
            &|_| None,
        )?;
        Ok(assigned)
    }

    fn ids(&self) -> &[EntryId] {
        self.form
            .arrays
            .arrays
            .get(&self.path)
            .map_or(&[][..], |state| state.ids.as_slice())
    }

    fn check_bounds(&self, index: usize, limit: usize) -> Result<()> {
        if index < limit {
            Ok(())
        } else {
            Err(FormError::IndexOutOfBounds {
                path: self.path.clone(),
                index,
                len: self.len(),
            })
        }
    }

    fn edit<T>(
        &mut self,
        op: &'static str,
        apply: impl FnOnce(&mut Vec<FieldValue>, &mut Vec<EntryId>) -> T,
        reindex: &dyn Fn(usize) -> Option<usize>,
    ) -> Result<T> {
        let form = &mut *self.form;
        let path = &self.path;

        let items = form.values.list_mut(path)?;
        let state = form
            .arrays
            .arrays
            .get_mut(path)
            .ok_or_else(|| FormError::NotAnArray(path.clone()))?;
        let result = apply(items, &mut state.ids);
        let len = state.ids.len();

        form.registry.reindex(path, reindex);
        form.errors.reindex(path, reindex);
        form.arrays.reindex(path, reindex);
        form.registry.bump(path);
        form.sync_arrays(false);
        form.refresh_dirty(path);
        form.refresh_disabled();

        debug!(%path, op, len, "field array updated");
        form.commit(Change::Value(path));
        Ok(result)
    }
}
