//! Immutable ATN data model and the minimal collaborator traits the
//! prediction core (`ll_predict_core`) is driven through.
//!
//! This crate owns none of the prediction algorithm — it is the C1 "ATN
//! graph" leaf component: states, transitions, and the read-only graph they
//! form, plus trait boundaries (`IntStream`, `TokenStream`, `RuleContext`)
//! for collaborators that live outside this workspace (a generated parser's
//! token stream and call-stack).

pub mod atn;
pub mod errors;
pub mod interval_set;
pub mod rule_context;
pub mod state;
pub mod stream;
pub mod token;
pub mod transition;
pub mod vocabulary;

pub use atn::{Atn, AtnBuilder, INVALID_ALT_NUMBER};
pub use errors::{AtnError, AtnResult};
pub use interval_set::IntervalSet;
pub use rule_context::RuleContext;
pub use state::ATNState;
pub use stream::{IntStream, MarkHandle, TokenStream};
pub use token::{TokenInfo, TOKEN_EOF, TOKEN_EPSILON, TOKEN_INVALID_TYPE};
pub use transition::Transition;
pub use vocabulary::Vocabulary;
