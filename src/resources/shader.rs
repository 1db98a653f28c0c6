use std::path::PathBuf;

use rustc_hash::FxHashMap;

use super::load_string;
use crate::{
    device::{ProgramId, RenderDevice},
    errors::SetupError,
};

/// Compiles programs from WGSL files and remembers them by name.
///
/// The vertex file declares the shared structs, bindings and `vs_main`; the
/// fragment file adds `fs_main`. Both are compiled as one module.
#[derive(Debug)]
pub struct ShaderManager {
    base: PathBuf,
    programs: FxHashMap<String, ProgramId>,
}

impl ShaderManager {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            programs: FxHashMap::default(),
        }
    }

    pub async fn create_program_from_paths<D: RenderDevice>(
        &mut self,
        device: &mut D,
        name: &str,
        vertex_path: &str,
        fragment_path: &str,
    ) -> Result<ProgramId, SetupError> {
        let mut source = String::new();
        for file in [vertex_path, fragment_path] {
            let path = self.base.join(file);
            let text = load_string(&path)
                .await
                .map_err(|e| SetupError::ShaderIo {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            source.push_str(&text);
            source.push('\n');
        }

        let program = device
            .create_program(name, &source)
            .map_err(|e| SetupError::ShaderCompile {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        log::debug!("created program '{}' with id {}", name, program.0);
        self.programs.insert(name.to_string(), program);
        Ok(program)
    }

    pub fn program_id(&self, name: &str) -> Result<ProgramId, SetupError> {
        self.programs
            .get(name)
            .copied()
            .ok_or_else(|| SetupError::ProgramNotFound(name.to_string()))
    }
}
