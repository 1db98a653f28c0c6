//! Typed entity/component store.
//!
//! Every component type gets its own insertion-ordered collection. Entries
//! inserted as *objects* carry a name that is unique within their type and
//! indexed for constant-time lookup; plain components are only reachable
//! through their entity.

use std::any::{Any, TypeId, type_name};

use rustc_hash::FxHashMap;

use crate::{errors::StoreError, input::InputManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(pub u32);

struct Entry<T> {
    entity: Entity,
    name: Option<String>,
    value: T,
}

struct ComponentStore<T> {
    entries: Vec<Entry<T>>,
    by_name: FxHashMap<String, usize>,
    by_entity: FxHashMap<Entity, usize>,
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            by_name: FxHashMap::default(),
            by_entity: FxHashMap::default(),
        }
    }
}

impl<T> ComponentStore<T> {
    fn insert(&mut self, entity: Entity, name: Option<String>, value: T) -> Result<(), StoreError> {
        if let Some(name) = &name {
            if self.by_name.contains_key(name) {
                return Err(StoreError::DuplicateName {
                    type_name: short_type_name::<T>(),
                    name: name.clone(),
                });
            }
        }
        if self.by_entity.contains_key(&entity) {
            return Err(StoreError::DuplicateComponent {
                type_name: short_type_name::<T>(),
                entity: entity.0,
            });
        }
        let index = self.entries.len();
        if let Some(name) = &name {
            self.by_name.insert(name.clone(), index);
        }
        self.by_entity.insert(entity, index);
        self.entries.push(Entry {
            entity,
            name,
            value,
        });
        Ok(())
    }
}

fn short_type_name<T>() -> &'static str {
    let full = type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Per-frame data handed to every registered [`System`].
pub struct SystemContext<'a> {
    pub dt: f32,
    pub input: &'a InputManager,
    pub active_camera: usize,
    pub active_model: usize,
}

/// Logic that mutates the scene once per frame, before rendering.
pub trait System {
    fn name(&self) -> &'static str;
    fn update(&mut self, scene: &mut Scene, ctx: &SystemContext<'_>);
}

#[derive(Default)]
pub struct Scene {
    next_entity: u32,
    entity_names: FxHashMap<Entity, String>,
    stores: FxHashMap<TypeId, Box<dyn Any>>,
    systems: Vec<Box<dyn System>>,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("entities", &self.next_entity)
            .field("component_types", &self.stores.len())
            .field("systems", &self.systems.len())
            .finish()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    fn store<T: 'static>(&self) -> Option<&ComponentStore<T>> {
        self.stores
            .get(&TypeId::of::<T>())
            .and_then(|store| store.downcast_ref::<ComponentStore<T>>())
    }

    fn store_mut<T: 'static>(&mut self) -> Option<&mut ComponentStore<T>> {
        self.stores
            .get_mut(&TypeId::of::<T>())
            .and_then(|store| store.downcast_mut::<ComponentStore<T>>())
    }

    fn store_or_default<T: 'static>(&mut self) -> &mut ComponentStore<T> {
        self.stores
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentStore::<T>::default()))
            .downcast_mut::<ComponentStore<T>>()
            .expect("component stores are keyed by their own TypeId")
    }

    pub fn create_entity(&mut self, name: &str) -> Entity {
        let entity = Entity(self.next_entity);
        self.next_entity += 1;
        if !name.is_empty() {
            self.entity_names.insert(entity, name.to_string());
        }
        entity
    }

    pub fn entity_name(&self, entity: Entity) -> Option<&str> {
        self.entity_names.get(&entity).map(String::as_str)
    }

    pub fn entity_count(&self) -> usize {
        self.next_entity as usize
    }

    /// Creates an entity for `value` and indexes it under `name`.
    /// Fails if an object of the same type already uses the name.
    pub fn add_object<T: 'static>(&mut self, name: &str, value: T) -> Result<Entity, StoreError> {
        if self.contains_object::<T>(name) {
            return Err(StoreError::DuplicateName {
                type_name: short_type_name::<T>(),
                name: name.to_string(),
            });
        }
        let entity = self.create_entity(name);
        self.insert_object(entity, name, value)?;
        Ok(entity)
    }

    /// Attaches a named object to an existing entity.
    pub fn insert_object<T: 'static>(
        &mut self,
        entity: Entity,
        name: &str,
        value: T,
    ) -> Result<(), StoreError> {
        self.store_or_default::<T>()
            .insert(entity, Some(name.to_string()), value)
    }

    /// Attaches an unnamed component to an existing entity.
    pub fn add_component<T: 'static>(&mut self, entity: Entity, value: T) -> Result<(), StoreError> {
        self.store_or_default::<T>().insert(entity, None, value)
    }

    pub fn contains_object<T: 'static>(&self, name: &str) -> bool {
        self.store::<T>()
            .is_some_and(|store| store.by_name.contains_key(name))
    }

    pub fn get_object_by_name<T: 'static>(&self, name: &str) -> Option<&T> {
        let store = self.store::<T>()?;
        let index = *store.by_name.get(name)?;
        Some(&store.entries[index].value)
    }

    pub fn get_object_by_name_mut<T: 'static>(&mut self, name: &str) -> Option<&mut T> {
        let store = self.store_mut::<T>()?;
        let index = *store.by_name.get(name)?;
        Some(&mut store.entries[index].value)
    }

    pub fn entity_by_name<T: 'static>(&self, name: &str) -> Option<Entity> {
        let store = self.store::<T>()?;
        let index = *store.by_name.get(name)?;
        Some(store.entries[index].entity)
    }

    /// Object at insertion position `index`.
    pub fn get_object_by_index<T: 'static>(&self, index: usize) -> Result<(Entity, &T), StoreError> {
        let count = self.object_count::<T>();
        self.store::<T>()
            .and_then(|store| store.entries.get(index))
            .map(|entry| (entry.entity, &entry.value))
            .ok_or(StoreError::IndexOutOfRange {
                type_name: short_type_name::<T>(),
                index,
                count,
            })
    }

    pub fn get_object_by_index_mut<T: 'static>(
        &mut self,
        index: usize,
    ) -> Result<(Entity, &mut T), StoreError> {
        let count = self.object_count::<T>();
        self.store_mut::<T>()
            .and_then(|store| store.entries.get_mut(index))
            .map(|entry| (entry.entity, &mut entry.value))
            .ok_or(StoreError::IndexOutOfRange {
                type_name: short_type_name::<T>(),
                index,
                count,
            })
    }

    /// Named entries of type `T` in insertion order.
    pub fn objects<T: 'static>(&self) -> impl Iterator<Item = (Entity, &str, &T)> {
        self.store::<T>()
            .into_iter()
            .flat_map(|store| store.entries.iter())
            .filter_map(|entry| {
                entry
                    .name
                    .as_deref()
                    .map(|name| (entry.entity, name, &entry.value))
            })
    }

    /// Every entry of type `T`, named or not, in insertion order.
    pub fn components<T: 'static>(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.store::<T>()
            .into_iter()
            .flat_map(|store| store.entries.iter())
            .map(|entry| (entry.entity, &entry.value))
    }

    pub fn components_mut<T: 'static>(&mut self) -> impl Iterator<Item = (Entity, &mut T)> {
        self.store_mut::<T>()
            .into_iter()
            .flat_map(|store| store.entries.iter_mut())
            .map(|entry| (entry.entity, &mut entry.value))
    }

    pub fn object_count<T: 'static>(&self) -> usize {
        self.store::<T>().map_or(0, |store| store.entries.len())
    }

    pub fn get_component<T: 'static>(&self, entity: Entity) -> Option<&T> {
        let store = self.store::<T>()?;
        let index = *store.by_entity.get(&entity)?;
        Some(&store.entries[index].value)
    }

    pub fn get_component_mut<T: 'static>(&mut self, entity: Entity) -> Option<&mut T> {
        let store = self.store_mut::<T>()?;
        let index = *store.by_entity.get(&entity)?;
        Some(&mut store.entries[index].value)
    }

    pub fn has_component<T: 'static>(&self, entity: Entity) -> bool {
        self.store::<T>()
            .is_some_and(|store| store.by_entity.contains_key(&entity))
    }

    pub fn register_system(&mut self, system: Box<dyn System>) {
        log::debug!("registering system {}", system.name());
        self.systems.push(system);
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Runs every system once, in registration order.
    pub fn update_systems(&mut self, ctx: &SystemContext<'_>) {
        let mut systems = std::mem::take(&mut self.systems);
        for system in systems.iter_mut() {
            system.update(self, ctx);
        }
        // keep anything registered while the systems were running
        systems.append(&mut self.systems);
        self.systems = systems;
    }
}
