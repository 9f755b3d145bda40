//! # agent-core
//!
//! Reasoning loop for agents running on a local model runtime: conversation
//! memory, a tool registry, and a provider-agnostic runtime facade.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                           Agent                              │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────────┐  │
//! │  │  Reasoning  │  │    Tool     │  │  Runtime facade      │  │
//! │  │    Loop     │──│  Registry   │──│  (LlmProvider)       │  │
//! │  └──────┬──────┘  └─────────────┘  └──────────────────────┘  │
//! │         │                                                    │
//! │  ┌──────┴──────┐                                             │
//! │  │ Conversation│  one per session, passed by `&mut`          │
//! │  └─────────────┘                                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait keeps the loop independent of the model backend;
//! the Ollama implementation lives in `agent-runtime`.

pub mod directive;
pub mod error;
pub mod memory;
pub mod message;
pub mod provider;
pub mod reasoning;
pub mod runtime;
pub mod session;
pub mod tool;

pub use directive::Intent;
pub use error::{AgentError, Result};
pub use memory::{Conversation, MemoryLimits};
pub use message::{Role, Turn};
pub use provider::{GenerationOptions, LlmProvider};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, ToolRound, TurnReport};
pub use runtime::Runtime;
pub use session::{ChatSession, FileSessionStore, MemorySessionStore, Session, SessionStore};
pub use tool::{Arguments, ParameterSchema, Tool, ToolInvocation, ToolRegistry, ToolSpec};
