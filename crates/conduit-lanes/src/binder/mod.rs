// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Uniform and attribute binding.
//!
//! A [`UniformBinder`] belongs to one linked program. It owns the device-side
//! uniform handles, assigns every uniform a stable slot index, and keeps the
//! last value written to each slot. Values are retained across draws and
//! uploaded, in slot order, right before each draw.

use crate::resource::DeviceObject;
use conduit_core::renderer::{
    CompiledShaders, Encoder, ProgramId, RenderError, ResourceError, ShaderStage,
    UniformDescriptor, UniformId, UniformKind,
};
use conduit_core::{DeviceContext, Handle, UniformOverflow};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

/// Vertex attribute name to input location.
pub type AttributeMap = HashMap<String, u32>;

/// Builds the attribute map of a compiled program.
pub fn reflect_attributes(shaders: &CompiledShaders) -> AttributeMap {
    shaders
        .vertex
        .attributes
        .iter()
        .map(|attribute| (attribute.name.clone(), attribute.location))
        .collect()
}

/// Packs `components`-wide groups of `values` into zero-padded `vec4` elements.
///
/// Returns the packed floats and the resulting element count.
pub fn pack_vec4(values: &[f32], components: usize) -> (Vec<f32>, usize) {
    let components = components.clamp(1, 4);
    let mut packed = Vec::with_capacity(values.len().div_ceil(components) * 4);
    for chunk in values.chunks(components) {
        packed.extend_from_slice(chunk);
        packed.resize(packed.len() + (4 - chunk.len()), 0.0);
    }
    let elements = packed.len() / 4;
    (packed, elements)
}

/// Metadata of one reflected uniform.
#[derive(Debug)]
pub struct UniformSlot {
    /// The name used in the shader source.
    pub name: String,
    /// The first stage that declares the uniform.
    pub stage: ShaderStage,
    /// Storage class.
    pub kind: UniformKind,
    /// Declared array length.
    pub max_elements: u16,
    /// The device uniform handle.
    pub uniform: DeviceObject<UniformId>,
}

/// The value last written to a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedValue {
    /// Flattened element data.
    pub values: Vec<f32>,
    /// Number of elements in `values`.
    pub element_len: usize,
}

/// How a uniform is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformRef<'a> {
    /// By slot index.
    Slot(u16),
    /// By name.
    Name(&'a str),
}

/// Reflected uniforms of one program and their retained values.
#[derive(Debug)]
pub struct UniformBinder {
    slots: Vec<UniformSlot>,
    by_name: HashMap<String, u16>,
    values: BTreeMap<u16, CachedValue>,
    textures: BTreeMap<u16, Handle>,
    overflow: UniformOverflow,
}

impl UniformBinder {
    /// Creates the device uniforms of `program` and assigns their slots.
    ///
    /// Slots follow declaration order, vertex stage first. A name declared by
    /// both stages gets a single slot. If any device call fails, the uniforms
    /// created so far are destroyed again.
    pub fn reflect(
        context: &DeviceContext,
        program: ProgramId,
        shaders: &CompiledShaders,
        overflow: UniformOverflow,
    ) -> Result<Self, ResourceError> {
        let mut binder = Self {
            slots: Vec::new(),
            by_name: HashMap::new(),
            values: BTreeMap::new(),
            textures: BTreeMap::new(),
            overflow,
        };
        if let Err(e) = binder.populate(context, program, shaders) {
            if let Err(release_err) = binder.release(context) {
                log::warn!("Failed to roll back uniforms of {program:?}: {release_err}");
            }
            return Err(e);
        }
        log::debug!(
            "Reflected {} uniform slot(s) for {program:?}.",
            binder.slots.len()
        );
        Ok(binder)
    }

    fn populate(
        &mut self,
        context: &DeviceContext,
        program: ProgramId,
        shaders: &CompiledShaders,
    ) -> Result<(), ResourceError> {
        let device = context.device();
        for (stage, declaration) in shaders.uniforms() {
            if self.by_name.contains_key(&declaration.name) {
                continue;
            }
            let slot = u16::try_from(self.slots.len()).map_err(|_| ResourceError::OutOfBounds)?;
            let count = declaration.count.max(1);
            let id = device.create_uniform(
                program,
                &UniformDescriptor {
                    name: Cow::Borrowed(&declaration.name),
                    kind: declaration.kind,
                    count,
                },
            )?;
            self.by_name.insert(declaration.name.clone(), slot);
            self.slots.push(UniformSlot {
                name: declaration.name.clone(),
                stage,
                kind: declaration.kind,
                max_elements: count,
                uniform: DeviceObject::new(id, context),
            });
        }
        Ok(())
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the program declares no uniform.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Looks up the slot of a uniform by name.
    pub fn slot(&self, name: &str) -> Option<u16> {
        self.by_name.get(name).copied()
    }

    /// Metadata of a slot.
    pub fn slot_info(&self, slot: u16) -> Option<&UniformSlot> {
        self.slots.get(usize::from(slot))
    }

    /// The value currently cached for a slot.
    pub fn cached(&self, slot: u16) -> Option<&CachedValue> {
        self.values.get(&slot)
    }

    /// Resolves a name or slot reference to a declared slot.
    pub fn resolve(&self, uniform: UniformRef<'_>) -> Result<u16, RenderError> {
        match uniform {
            UniformRef::Slot(slot) if usize::from(slot) < self.slots.len() => Ok(slot),
            UniformRef::Slot(slot) => Err(RenderError::InvalidOperation(format!(
                "uniform slot {slot} is not declared"
            ))),
            UniformRef::Name(name) => self.slot(name).ok_or_else(|| {
                RenderError::InvalidOperation(format!("uniform '{name}' is not declared"))
            }),
        }
    }

    /// Caches `element_len` elements for a slot, replacing its previous value.
    ///
    /// `values` must hold exactly `element_len` elements of the slot's kind.
    /// Nothing reaches the device until the next [`flush`](Self::flush).
    pub fn set(&mut self, slot: u16, values: &[f32], element_len: usize) -> Result<(), RenderError> {
        let info = self.slot_info(slot).ok_or_else(|| {
            RenderError::InvalidOperation(format!("uniform slot {slot} is not declared"))
        })?;
        if info.kind == UniformKind::Sampler {
            return Err(RenderError::InvalidOperation(format!(
                "uniform '{}' is a sampler and takes a texture",
                info.name
            )));
        }

        let stride = info.kind.floats_per_element();
        if element_len == 0 || element_len.checked_mul(stride) != Some(values.len()) {
            return Err(RenderError::InvalidOperation(format!(
                "uniform '{}' takes {stride} float(s) per element, got {} for {element_len} element(s)",
                info.name,
                values.len()
            )));
        }

        let max = usize::from(info.max_elements);
        let value = if element_len > max {
            match self.overflow {
                UniformOverflow::Reject => {
                    return Err(RenderError::InvalidOperation(format!(
                        "uniform '{}' holds {max} element(s), got {element_len}",
                        info.name
                    )));
                }
                UniformOverflow::Truncate => {
                    log::trace!(
                        "Truncating uniform '{}' from {element_len} to {max} element(s).",
                        info.name
                    );
                    CachedValue {
                        values: values[..stride * max].to_vec(),
                        element_len: max,
                    }
                }
            }
        } else {
            CachedValue {
                values: values.to_vec(),
                element_len,
            }
        };
        self.values.insert(slot, value);
        Ok(())
    }

    /// Binds a texture to a sampler slot, or unbinds it with `None`.
    pub fn bind_texture(&mut self, slot: u16, texture: Option<Handle>) -> Result<(), RenderError> {
        let info = self.slot_info(slot).ok_or_else(|| {
            RenderError::InvalidOperation(format!("uniform slot {slot} is not declared"))
        })?;
        if info.kind != UniformKind::Sampler {
            return Err(RenderError::InvalidOperation(format!(
                "uniform '{}' is not a sampler",
                info.name
            )));
        }
        match texture {
            Some(texture) => self.textures.insert(slot, texture),
            None => self.textures.remove(&slot),
        };
        Ok(())
    }

    /// Sampler slots with a bound texture, in slot order.
    pub fn texture_bindings(&self) -> impl Iterator<Item = (&UniformSlot, Handle)> + '_ {
        self.textures
            .iter()
            .filter_map(|(slot, texture)| Some((self.slot_info(*slot)?, *texture)))
    }

    /// Unbinds every texture. Returns how many were bound.
    pub fn clear_textures(&mut self) -> usize {
        let count = self.textures.len();
        self.textures.clear();
        count
    }

    /// Uploads every cached value in slot order. Returns the number of uploads.
    pub fn flush(&self, encoder: &mut dyn Encoder) -> usize {
        let mut uploads = 0;
        for (slot, value) in &self.values {
            if let Some(info) = self.slot_info(*slot) {
                encoder.upload_uniform(info.uniform.id, &value.values);
                uploads += 1;
            }
        }
        uploads
    }

    /// Destroys the device uniforms that belong to the current device.
    ///
    /// Every slot is attempted; the first failure is returned.
    pub fn release(self, context: &DeviceContext) -> Result<bool, ResourceError> {
        let mut destroyed = false;
        let mut first_error = None;
        for slot in self.slots {
            match slot
                .uniform
                .release(context, |device, id| device.destroy_uniform(id))
            {
                Ok(called) => destroyed |= called,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(destroyed),
        }
    }
}
