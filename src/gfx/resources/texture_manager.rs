//! Named textures mapped onto a fixed set of hardware binding slots
//!
//! The registry (name -> texture) and the slot table (slot -> name) are
//! separate pieces of state. Slots are handed out first-fit by index, so an
//! enable/disable cycle can move a texture to a different slot.

use std::{collections::HashMap, rc::Rc};

use crate::{
    error::TextureError,
    gfx::{backend::GraphicsBackend, resources::texture::Texture},
};

struct SlotEntry<B: GraphicsBackend> {
    name: String,
    texture: Rc<Texture<B>>,
}

pub struct TextureManager<B: GraphicsBackend> {
    textures: HashMap<String, Rc<Texture<B>>>,
    slots: Vec<Option<SlotEntry<B>>>,
}

impl<B: GraphicsBackend> TextureManager<B> {
    /// Creates a manager with `capacity` binding slots
    pub fn new(capacity: usize) -> Self {
        Self {
            textures: HashMap::new(),
            slots: std::iter::repeat_with(|| None).take(capacity).collect(),
        }
    }

    /// Registers `texture` under `name`.
    ///
    /// Returns `false` without replacing anything if the name is taken.
    pub fn add_texture(&mut self, name: &str, texture: Rc<Texture<B>>) -> bool {
        if self.textures.contains_key(name) {
            return false;
        }
        self.textures.insert(name.to_owned(), texture);
        true
    }

    /// Removes `name` from the registry.
    ///
    /// A slot currently holding `name` keeps the texture alive until
    /// [`disable_all`](Self::disable_all) frees it.
    pub fn remove_texture(&mut self, name: &str) -> bool {
        self.textures.remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.textures.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Rc<Texture<B>>> {
        self.textures.get(name)
    }

    /// Binds `name` at the lowest free slot and returns that slot.
    ///
    /// Enabling a name that already holds a slot returns that slot and
    /// allocates nothing, so a name never occupies two slots.
    pub fn enable_texture(&mut self, name: &str) -> Result<usize, TextureError> {
        let texture = self
            .textures
            .get(name)
            .ok_or_else(|| TextureError::NotRegistered(name.to_owned()))?;

        if let Some(slot) = self.slot_of(name) {
            return Ok(slot);
        }

        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or_else(|| TextureError::SlotExhausted {
                name: name.to_owned(),
                capacity: self.slots.len(),
            })?;

        texture.bind(slot);
        let texture = Rc::clone(texture);
        self.slots[slot] = Some(SlotEntry {
            name: name.to_owned(),
            texture,
        });
        log::debug!("enabled texture `{name}` at slot {slot}");
        Ok(slot)
    }

    /// Unbinds `name` and frees its slot, returning the slot it held
    pub fn disable_texture(&mut self, name: &str) -> Result<usize, TextureError> {
        if !self.textures.contains_key(name) {
            return Err(TextureError::NotRegistered(name.to_owned()));
        }

        let slot = self
            .slot_of(name)
            .ok_or_else(|| TextureError::NotEnabled(name.to_owned()))?;

        if let Some(entry) = self.slots[slot].take() {
            entry.texture.unbind(slot);
        }
        log::debug!("disabled texture `{name}` at slot {slot}");
        Ok(slot)
    }

    /// Frees every occupied slot in index order
    pub fn disable_all(&mut self) {
        for (slot, entry) in self.slots.iter_mut().enumerate() {
            if let Some(SlotEntry { name, texture }) = entry.take() {
                texture.unbind(slot);
                log::trace!("freed slot {slot} (`{name}`)");
            }
        }
        log::trace!("all texture slots disabled");
    }

    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|entry| entry.as_ref().is_some_and(|entry| entry.name == name))
    }

    /// Name bound at each slot
    pub fn slots(&self) -> Vec<Option<&str>> {
        self.slots
            .iter()
            .map(|entry| entry.as_ref().map(|entry| entry.name.as_str()))
            .collect()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}

impl<B: GraphicsBackend> Drop for TextureManager<B> {
    fn drop(&mut self) {
        self.disable_all();
    }
}
