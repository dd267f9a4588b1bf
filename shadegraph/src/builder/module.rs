//! Module assembly
//!
//! The driver declares every variable the session collected, replays the
//! events, stores the outputs and concatenates the sections behind the
//! module header. The session is reset afterward, whether the compilation
//! succeeded or not.

use fnv::FnvHashSet as HashSet;
use log::debug;
use rspirv::binary::Disassemble;
use spirv_headers::ExecutionModel as ShaderType;
use spirv_headers::{
    AddressingModel, Capability, Decoration, ExecutionMode, FunctionControl, MemoryModel, Op,
    Word, MAGIC_NUMBER,
};

use super::{BindingKind, Builder, Session};
use crate::encoder::{Encoder, IdAllocator};
use crate::errors::*;
use crate::events;
use crate::node;
use crate::pointer::{self, Pointer};
use crate::types::{StorageClass, TypeName};

/// Global code generation settings
#[derive(Clone, Debug)]
pub struct Settings {
    /// The type of the shader module being built
    pub stage: ShaderType,
    /// Name of the entry point function
    pub entry_point: String,
    /// Target version as `(major, minor)`
    pub version: (u8, u8),
    /// Generator magic number written in the module header
    pub generator: u32,
    /// Workgroup size of a compute shader
    pub local_size: [u32; 3],
    /// Refuse any loop whose end is lower than its start
    pub strict_loop_bounds: bool,
}

impl From<ShaderType> for Settings {
    fn from(stage: ShaderType) -> Self {
        Settings {
            stage,
            entry_point: String::from("main"),
            version: (1, 0),
            generator: 0,
            local_size: [1, 1, 1],
            strict_loop_bounds: false,
        }
    }
}

const GLSL_STD_450: &str = "GLSL.std.450";

/// Ids of the entry function, allocated before the declarations
struct Entry {
    void_type: Word,
    function_type: Word,
    function: Word,
    label: Word,
    glsl: Word,
}

fn push_string_instruction(out: &mut Encoder, op: Op, before: &[Word], string: &str) {
    let pending = out.begin(op);
    out.extend(before);
    out.push_str(string);
    out.end(pending);
}

impl Session {
    /// Compile the graph into a list of SPIR-V words
    pub fn compile(&mut self) -> Result<Vec<Word>> {
        debug!(
            "compiling {:?} shader, {} outputs and {} builtins",
            self.settings.stage,
            self.outputs.len(),
            self.builtins.len()
        );

        let res = self.assemble();
        self.reset();

        if let Ok(ref words) = res {
            debug!("module is {} words long, id bound {}", words.len(), words[3]);
        }

        res
    }

    /// Compile the graph into the little-endian bytes of a SPIR-V module
    pub fn compile_binary(&mut self) -> Result<Vec<u8>> {
        let words = self.compile()?;
        Ok(words.iter().flat_map(|word| word.to_le_bytes().to_vec()).collect())
    }

    /// Compile the graph into a human-readable SPIR-V assembly
    pub fn compile_assembly(&mut self) -> Result<String> {
        let words = self.compile()?;
        match rspirv::mr::load_words(&words) {
            Ok(module) => Ok(module.disassemble()),
            Err(err) => bail!(ErrorKind::Disassembly(format!("{:?}", err))),
        }
    }

    fn declare_variable(
        &mut self,
        pointer: Pointer,
        storage: StorageClass,
        locals: bool,
    ) -> Result<Word> {
        let (id, ty) = {
            let data = self.pointers.get(pointer)?;
            (data.id, data.type_name())
        };

        let type_id = self.register_type(&ty)?;
        let section = if locals {
            &mut self.sections.locals
        } else {
            &mut self.sections.declarations
        };
        section.instruction(Op::Variable, &[type_id, id, storage.word()]);

        self.pointers.get_mut(pointer)?.emitted = true;
        Ok(id)
    }

    fn decorate(&mut self, target: Word, decoration: Decoration, operands: &[Word]) {
        let mut words = Vec::with_capacity(operands.len() + 2);
        words.push(target);
        words.push(decoration as Word);
        words.extend_from_slice(operands);
        self.sections.annotations.instruction(Op::Decorate, &words);
    }

    /// Declare the global variables, returning the interface of the entry point
    fn declare_globals(&mut self) -> Result<Vec<Word>> {
        let mut interface = Vec::new();

        let inputs: Vec<_> = self.inputs.iter().map(|input| input.pointer).collect();
        for (location, pointer) in inputs.into_iter().enumerate() {
            let id = self.declare_variable(pointer, StorageClass::Input, false)?;
            self.decorate(id, Decoration::Location, &[location as Word]);
            interface.push(id);
        }

        let outputs: Vec<_> = self.outputs.iter().map(|output| output.pointer).collect();
        for (location, pointer) in outputs.into_iter().enumerate() {
            let id = self.declare_variable(pointer, StorageClass::Output, false)?;
            self.decorate(id, Decoration::Location, &[location as Word]);
            interface.push(id);
        }

        let builtins: Vec<_> = self
            .builtins
            .iter()
            .map(|slot| (slot.builtin, slot.pointer))
            .collect();
        for (builtin, pointer) in builtins {
            let id = self.declare_variable(pointer, StorageClass::Output, false)?;
            self.decorate(id, Decoration::BuiltIn, &[builtin.word()]);
            interface.push(id);
        }

        let bindings: Vec<_> = self
            .bindings
            .iter()
            .map(|binding| {
                (
                    binding.set,
                    binding.binding,
                    binding.kind,
                    binding.ty.clone(),
                    binding.pointer,
                )
            })
            .collect();

        let mut blocks = HashSet::default();
        for (set, binding, kind, ty, pointer) in bindings {
            let storage = match kind {
                BindingKind::Texture => StorageClass::UniformConstant,
                _ => StorageClass::Uniform,
            };

            let id = self.declare_variable(pointer, storage, false)?;
            self.decorate(id, Decoration::DescriptorSet, &[set]);
            self.decorate(id, Decoration::Binding, &[binding]);

            let block = match kind {
                BindingKind::Uniform => Decoration::Block,
                BindingKind::Storage => Decoration::BufferBlock,
                BindingKind::Texture => continue,
            };

            let struct_id = self.types.get_id(&ty)?;
            if blocks.insert((struct_id, block as Word)) {
                self.decorate(struct_id, block, &[]);
            }
            self.types
                .ensure_decorated(&ty, &mut self.sections.annotations)?;
        }

        let locals = self.locals.clone();
        for pointer in locals {
            self.declare_variable(pointer, StorageClass::Function, true)?;
        }

        Ok(interface)
    }

    /// Store the outputs and the builtins at the end of the function body
    fn write_outputs(&mut self) -> Result<()> {
        let stores: Vec<_> = self
            .outputs
            .iter()
            .map(|output| (output.pointer, output.value))
            .chain(
                self.builtins
                    .iter()
                    .map(|slot| (slot.pointer, slot.value)),
            )
            .collect();

        for (pointer, value) in stores {
            let value_id = node::ensure_defined(self, value)?;
            let pointer_id = pointer::ensure_pointer(self, pointer)?;
            self.push_instruction(Op::Store, &[pointer_id, value_id]);
        }

        Ok(())
    }

    fn assemble(&mut self) -> Result<Vec<Word>> {
        if !self.scopes.is_empty() {
            bail!(ErrorKind::ControlFlow("a block is still open at compile time"));
        }

        let void_type = self.register_type(&TypeName::Void)?;
        let entry = Entry {
            void_type,
            function_type: self.ids.next(),
            function: self.ids.next(),
            label: self.ids.next(),
            glsl: self.ids.next(),
        };
        self.sections
            .declarations
            .instruction(Op::TypeFunction, &[entry.function_type, entry.void_type]);

        let interface = self.declare_globals()?;

        // Inputs are read at the top of the function so that every block
        // can use them
        let inputs: Vec<_> = self.inputs.iter().map(|input| input.value).collect();
        for value in inputs {
            node::ensure_defined(self, value)?;
        }

        events::write_events(self)?;
        self.write_outputs()?;

        let mut out = Encoder::new();

        // Header
        let (major, minor) = self.settings.version;
        out.extend(&[
            MAGIC_NUMBER,
            (Word::from(major) << 16) | (Word::from(minor) << 8),
            self.settings.generator,
            0,
            0,
        ]);

        out.instruction(Op::Capability, &[Capability::Shader as Word]);
        let mut capabilities: Vec<_> = self
            .builtins
            .iter()
            .filter_map(|slot| slot.builtin.capability())
            .collect();
        capabilities.sort_by_key(|capability| *capability as Word);
        capabilities.dedup();
        for capability in capabilities {
            out.instruction(Op::Capability, &[capability as Word]);
        }

        push_string_instruction(&mut out, Op::ExtInstImport, &[entry.glsl], GLSL_STD_450);
        out.instruction(
            Op::MemoryModel,
            &[AddressingModel::Logical as Word, MemoryModel::GLSL450 as Word],
        );

        let pending = out.begin(Op::EntryPoint);
        out.push(self.settings.stage as Word);
        out.push(entry.function);
        out.push_str(&self.settings.entry_point);
        out.extend(&interface);
        out.end(pending);

        match self.settings.stage {
            ShaderType::Fragment => out.instruction(
                Op::ExecutionMode,
                &[entry.function, ExecutionMode::OriginUpperLeft as Word],
            ),
            ShaderType::GLCompute => {
                let [x, y, z] = self.settings.local_size;
                out.instruction(
                    Op::ExecutionMode,
                    &[entry.function, ExecutionMode::LocalSize as Word, x, y, z],
                );
            }
            _ => {}
        }

        out.append(&self.sections.annotations);
        out.append(&self.sections.declarations);

        // Entry function
        out.instruction(
            Op::Function,
            &[
                entry.void_type,
                entry.function,
                FunctionControl::NONE.bits(),
                entry.function_type,
            ],
        );
        out.instruction(Op::Label, &[entry.label]);
        out.append(&self.sections.locals);
        out.append(&self.sections.body);
        out.instruction(Op::Return, &[]);
        out.instruction(Op::FunctionEnd, &[]);

        out.patch(3, self.ids.bound());
        Ok(out.into_words())
    }

    /// Start over with an empty graph, keeping the settings and the input slots
    pub fn reset(&mut self) {
        let outputs: Vec<_> = self
            .outputs
            .drain(..)
            .map(|output| output.value)
            .chain(self.builtins.drain(..).map(|slot| slot.value))
            .collect();
        for value in outputs {
            // a root may already have been released by the caller
            self.graph.unref_tree(value).ok();
        }
        debug!("{} nodes alive after releasing the outputs", self.graph.len());

        let inputs: Vec<_> = self.inputs.drain(..).map(|input| input.ty).collect();

        self.ids = IdAllocator::default();
        self.graph.clear();
        self.pointers.clear();
        self.events.clear();
        self.types.reset();
        self.constants.clear();
        self.sections.clear();

        self.ifs.clear();
        self.loops.clear();
        self.scopes.clear();
        self.bindings.clear();
        self.locals.clear();

        for ty in inputs {
            // input nodes have no operands, adding them cannot fail
            self.add_input(ty).ok();
        }
    }
}
