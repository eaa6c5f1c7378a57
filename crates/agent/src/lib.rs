//! The drafting pipeline — the heart of Inkwell.
//!
//! A request follows a **Check → Route → Assemble → Stream → Resolve**
//! cycle:
//!
//! 1. **Check** the instruction against the input rules
//! 2. **Route** the request to a credential (possibly prompting the writer)
//! 3. **Assemble** a bounded prompt from cues, project context and references
//! 4. **Stream** the response, re-rendering the live text per chunk
//! 5. **Resolve** the settled text into prose and an optional structured block
//!
//! Only a completed, non-blank response touches chat history and the
//! vocabulary.

pub mod context;
pub mod mode;
pub mod resolver;
pub mod session;
pub mod stream;
pub mod stream_event;

pub use context::{
    AssembledPrompt, AssemblyInput, AssemblyMetadata, ChatHistory, ContextAssembler,
    PromptContext,
};
pub use mode::OperationMode;
pub use resolver::{EMPTY_RESPONSE_PLACEHOLDER, ResolvedResponse, render_prose, resolve};
pub use session::{DraftOutcome, DraftRequest, DraftSession, EventSink, SessionError};
pub use stream::{StreamConsumer, StreamFailure, StreamOutcome, StreamState};
pub use tokio_util::sync::CancellationToken;
pub use stream_event::{DraftEvent, FailureKind};
