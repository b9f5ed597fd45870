//! Social Agent stage implementations and the workflow orchestrator.
//!
//! This crate provides the four model-backed stages (researcher, copywriter,
//! manager, reviewer), the prompt templates they render, the tolerant parser
//! that turns model text into records, and the [`Orchestrator`] that drives
//! the state machine for each request.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Stages sequence calls between the domain types
//! in the [`pipeline`] crate and the [`pipeline::ModelClient`] port. Which
//! state follows a review is decided by [`pipeline::decide_after_review`];
//! nothing here adds domain rules of its own.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`orchestrator`] | [`Orchestrator`], [`StageSet`] |
//! | [`stages`] | [`Researcher`], [`Copywriter`], [`Manager`], [`Reviewer`], [`ModelCall`] |
//! | `prompts` | Template rendering |
//! | `extract` | Labelled-section parsing |

mod extract;
pub mod orchestrator;
mod prompts;
pub mod stages;

pub use orchestrator::{Orchestrator, StageSet};
pub use stages::{Copywriter, Manager, ModelCall, Researcher, Reviewer};
