//! Analysis Agents
//!
//! Each agent turns one kind of material into a typed report by building a
//! prompt, calling the AI gateway and reshaping the model output:
//!
//! - **Classification Agent**: decides what a set of screenshots shows and extracts its text
//! - **Profile Agent**: profile overview and single-photo (avatar) critique
//! - **Post Agent**: reads a social post for what it says about the poster
//! - **Chat Log Agent**: judges how a conversation with a match is going
//! - **Personality Agent**: personality report from all available evidence
//! - **Persona Agent**: replies in character as the analyzed person
//!
//! ## Typical flow
//!
//! ```text
//! Screenshots
//!      │
//!      ▼
//! ┌────────────────┐
//! │ Classification │  → category + extracted fields
//! └────────────────┘
//!      │
//!      ▼
//! ┌────────────────┐
//! │ Profile / Post │  → per-material reports
//! │ / Chat Log     │
//! └────────────────┘
//!      │
//!      ▼
//! ┌────────────────┐
//! │  Personality   │  → combined report
//! └────────────────┘
//!      │
//!      ▼
//! ┌────────────────┐
//! │    Persona     │  → rehearsal chat
//! └────────────────┘
//! ```
//!
//! Model output that cannot be parsed yields an empty report (all fields
//! null or empty) rather than an error.

pub mod prompt;
pub mod classify;
pub mod profile;
pub mod post;
pub mod chat_log;
pub mod personality;
pub mod persona;

pub use classify::ClassificationAgent;
pub use profile::ProfileAgent;
pub use post::PostAgent;
pub use chat_log::ChatLogAgent;
pub use personality::PersonalityAgent;
pub use persona::PersonaAgent;
