//! # absval: Abstract Values for Whole-Program Optimization
//!
//! **`absval`** is the value lattice used by an optimizing compiler to track what is
//! known about runtime values at compile time: exact constants, constant-shaped
//! objects, numeric ranges and small sets, per-bit knowledge, and nullability.
//!
//! ## What is an abstract value?
//!
//! An abstract value summarizes every runtime value a program quantity can take.
//! `5` means "always five", `{1, 2}` means "one or two", `null | "x"` means "either
//! null or the string x", and `⊤` means "nothing useful is known".
//! When control flow merges, facts are combined with a **join**, which returns the
//! least abstraction that covers both inputs.
//!
//! ## Key Features
//!
//! - **Factory-Centric Canonicalization**: Constants are created through the
//!   [`AbstractValueFactory`][crate::factory::AbstractValueFactory], which interns
//!   them so that equality is a pointer comparison. The factory is safe to share
//!   between optimization workers.
//! - **Closed Sum Type**: [`AbstractValue`][crate::value::AbstractValue] is an enum;
//!   every classification and join is an exhaustive `match`.
//! - **Policy-Driven Join**: The [`join`] engine synthesizes small sets or bit
//!   patterns only where the call site asks for them.
//! - **Materialization & Rewriting**: Single values can be turned back into code
//!   ([`materialize`]) and rewritten after items are renamed ([`rewrite`]).
//!
//! ## Basic Usage
//!
//! ```rust
//! use absval::factory::AbstractValueFactory;
//! use absval::join::{AbstractValueJoiner, JoinPolicy};
//! use absval::types::TypeElement;
//! use absval::value::AbstractValue;
//!
//! // 1. One factory per compilation session
//! let factory = AbstractValueFactory::default();
//! let joiner = AbstractValueJoiner::new(&factory);
//!
//! // 2. Create constants
//! let five: AbstractValue = factory.create_single_number_value(5).into();
//! let six: AbstractValue = factory.create_single_number_value(6).into();
//!
//! // 3. Merge two paths: only bit 2 is set in both
//! let joined = joiner.join(&five, &six, &TypeElement::int(), JoinPolicy::CONSTANT_PROPAGATION);
//! assert!(joined.maybe_contains_int(5));
//! assert!(!joined.maybe_contains_int(0));
//!
//! // 4. Nullability composes at reference types
//! let x: AbstractValue = factory.create_single_string_value("x").into();
//! let string = TypeElement::reference("Ljava/lang/String;");
//! let maybe_x = joiner.join(&AbstractValue::null(), &x, &string, JoinPolicy::CONSTANT_PROPAGATION);
//! assert_eq!(maybe_x.to_string(), "null | \"x\"");
//! ```
//!
//! ## Core Components
//!
//! - **[`value`]**: The [`AbstractValue`][crate::value::AbstractValue] lattice and its queries.
//! - **[`factory`]**: Canonicalizing constructors.
//! - **[`join`]**: Join, meet, and the per-call-site policies.
//! - **[`number`]**: Bit, interval and set abstractions over integers.
//! - **[`object_state`]**: Field snapshots of constant objects.

pub mod factory;
pub mod join;
pub mod materialize;
pub mod naming;
pub mod number;
pub mod object_state;
pub mod rewrite;
pub mod single;
pub mod types;
pub mod utils;
pub mod value;
