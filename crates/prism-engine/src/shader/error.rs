use std::fmt;

/// Pipeline stage of a shader source.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub(crate) fn to_naga(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

/// Failure while turning shader sources into a usable program.
///
/// All variants indicate a defect in the embedded shader sources or in the
/// names the renderer asks for; none of them is transient.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// A single stage failed to parse or validate.
    ShaderCompile { stage: ShaderStage, message: String },
    /// The stages compiled but do not form a valid program.
    ProgramLink { message: String },
    /// A required attribute or uniform is not part of the linked program.
    MissingHandle { name: String },
}

impl BuildError {
    pub(crate) fn compile(stage: ShaderStage, message: impl Into<String>) -> Self {
        Self::ShaderCompile { stage, message: message.into() }
    }

    pub(crate) fn link(message: impl Into<String>) -> Self {
        Self::ProgramLink { message: message.into() }
    }

    pub(crate) fn missing(name: impl Into<String>) -> Self {
        Self::MissingHandle { name: name.into() }
    }
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::ShaderCompile { stage, message } => {
                write!(f, "{stage} shader failed to compile: {message}")
            }
            BuildError::ProgramLink { message } => write!(f, "program failed to link: {message}"),
            BuildError::MissingHandle { name } => {
                write!(f, "`{name}` could not be found in the linked program")
            }
        }
    }
}

impl std::error::Error for BuildError {}
