//! Prompt context: layered assembly and the bounded chat history.
//!
//! # Layers (in prompt order)
//!
//! | Layer | Source | Bound |
//! |-------|--------|-------|
//! | 1. Instruction | Writer's input, formatted per mode | Hard input ceiling |
//! | 2. Structured Cues | Parsed from the instruction | None |
//! | 3. Project Context | Relevance sample of notes and lore | Item count, per-item chars |
//! | 4. Selected References | Explicit selections | Per-item chars |
//! | 5. Chat History | Earlier exchanges in this mode | Oldest pairs evicted |

pub mod assembler;
pub mod history;
pub mod sampler;

pub use assembler::{
    AssembledPrompt, AssemblyInput, AssemblyMetadata, ContextAssembler, PROJECT_HEADER,
    PromptContext, REFERENCES_HEADER,
};
pub use history::ChatHistory;
