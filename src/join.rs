//! Join and meet over the abstract value lattice.
//!
//! # Join
//!
//! [`AbstractValueJoiner::join`] computes an upper bound of two values at a given
//! static type. The rules are applied in priority order:
//!
//! 1. `join(⊥, x) = x`, `join(x, ⊤) = ⊤`
//! 2. `join(⊤, x) = ⊤`, `join(x, ⊥) = x`, `join(x, x) = x`
//! 3. reference types: nullability composition (`null ⊔ x = null | x`), else `⊤`
//! 4. primitive types: the capabilities enabled by the [`JoinPolicy`]
//!    - *number set*: exact numbers and sets merge into a small set
//!    - *definite bits* (`int` only): keep the bits both operands agree on
//!
//! Anything not covered gives `⊤`. Join never fails.
//!
//! The call sites use different policies, exposed as thin wrappers:
//! [`ConstantPropagationJoiner`], [`FieldJoiner`] and [`ParameterJoiner`].
//!
//! # Meet
//!
//! [`AbstractValueJoiner::meet`] narrows two values to what they may share. It is
//! exact for numeric abstractions wherever the intersection is representable and
//! gives `⊥` only for provably disjoint inputs. Otherwise it keeps the input that
//! describes fewer concrete values, so no shared value is ever dropped.
//!
//! # Example
//!
//! ```
//! use absval::factory::AbstractValueFactory;
//! use absval::join::{AbstractValueJoiner, JoinPolicy};
//! use absval::types::TypeElement;
//!
//! let factory = AbstractValueFactory::new();
//! let joiner = AbstractValueJoiner::new(&factory);
//!
//! let one = factory.create_single_number_value(1).into();
//! let two = factory.create_single_number_value(2).into();
//! let joined = joiner.join(&one, &two, &TypeElement::int(), JoinPolicy::ENUM_DISCRIMINATOR_FIELD);
//! assert_eq!(joined, factory.create_number_from_set_value([1, 2]));
//! ```

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use log::{debug, warn};

use crate::factory::AbstractValueFactory;
use crate::number::{NumberAbstraction, NumberFromSetBuilder, MAX_SIZE};
use crate::types::{FieldRef, TypeElement};
use crate::value::{AbstractValue, NullOrAbstractValue};

/// Name of the synthetic class-id field introduced when merging enum-like classes.
pub const DISCRIMINATOR_FIELD_NAME: &str = "$classId";

/// Which numeric sub-abstractions a join may synthesize.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct JoinPolicy {
    pub number_set_abstraction: bool,
    pub definite_bits_abstraction: bool,
}

impl JoinPolicy {
    /// Merging locals and arguments across control-flow paths.
    pub const CONSTANT_PROPAGATION: JoinPolicy = JoinPolicy {
        number_set_abstraction: false,
        definite_bits_abstraction: true,
    };

    /// Merging the class-id field; its values are few and small.
    pub const ENUM_DISCRIMINATOR_FIELD: JoinPolicy = JoinPolicy {
        number_set_abstraction: true,
        definite_bits_abstraction: false,
    };

    /// Merging any other field across its initializers.
    pub const STRUCT_FIELD: JoinPolicy = JoinPolicy {
        number_set_abstraction: false,
        definite_bits_abstraction: true,
    };

    /// Merging a parameter across call sites.
    pub const PARAMETER: JoinPolicy = JoinPolicy::CONSTANT_PROPAGATION;
}

/// Self-checks run by the joiner on every call.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct JoinerOptions {
    /// Recompute every join with swapped operands and compare.
    pub check_commutativity: bool,
}

impl Default for JoinerOptions {
    fn default() -> Self {
        Self {
            check_commutativity: cfg!(debug_assertions),
        }
    }
}

/// The join/meet engine.
#[derive(Debug, Copy, Clone)]
pub struct AbstractValueJoiner<'f> {
    factory: &'f AbstractValueFactory,
    options: JoinerOptions,
}

impl<'f> AbstractValueJoiner<'f> {
    pub fn new(factory: &'f AbstractValueFactory) -> Self {
        Self::with_options(factory, JoinerOptions::default())
    }

    pub fn with_options(factory: &'f AbstractValueFactory, options: JoinerOptions) -> Self {
        Self { factory, options }
    }

    pub fn factory(&self) -> &'f AbstractValueFactory {
        self.factory
    }

    pub fn options(&self) -> JoinerOptions {
        self.options
    }

    /// Least upper bound of `a` and `b` at type `ty`, as far as `policy` allows.
    pub fn join(
        &self,
        a: &AbstractValue,
        b: &AbstractValue,
        ty: &TypeElement,
        policy: JoinPolicy,
    ) -> AbstractValue {
        let result = self.join_internal(a, b, ty, policy);
        if self.options.check_commutativity {
            let reversed = self.join_internal(b, a, ty, policy);
            if result != reversed {
                warn!(
                    "join is not commutative at {}: join({}, {}) = {}, join({}, {}) = {}",
                    ty, a, b, result, b, a, reversed
                );
                debug_assert_eq!(result, reversed, "join is not commutative");
            }
        }
        result
    }

    /// Checks if `a` is below `b`, i.e. `join(a, b) == b`.
    pub fn less_than_or_equal_to(
        &self,
        a: &AbstractValue,
        b: &AbstractValue,
        ty: &TypeElement,
        policy: JoinPolicy,
    ) -> bool {
        &self.join(a, b, ty, policy) == b
    }

    fn join_internal(
        &self,
        a: &AbstractValue,
        b: &AbstractValue,
        ty: &TypeElement,
        policy: JoinPolicy,
    ) -> AbstractValue {
        if a.is_bottom() {
            debug!("join(⊥, x) => x");
            return b.clone();
        }
        if b.is_unknown() {
            debug!("join(x, ⊤) => ⊤");
            return AbstractValue::Unknown;
        }
        if a.is_unknown() {
            debug!("join(⊤, x) => ⊤");
            return AbstractValue::Unknown;
        }
        if b.is_bottom() {
            debug!("join(x, ⊥) => x");
            return a.clone();
        }
        if a == b {
            debug!("join(x, x) => x");
            return a.clone();
        }

        match ty {
            TypeElement::Reference(_) => self.join_reference(a, b),
            TypeElement::Primitive(_) => self.join_primitive(a, b, ty, policy),
        }
    }

    fn join_reference(&self, a: &AbstractValue, b: &AbstractValue) -> AbstractValue {
        if a.is_null() {
            debug!("join(null, {}) => null | x", b);
            return NullOrAbstractValue::create(b.clone());
        }
        if b.is_null() {
            debug!("join({}, null) => null | x", a);
            return NullOrAbstractValue::create(a.clone());
        }
        if let Some(nullable) = a.as_null_or_abstract_value() {
            if nullable.non_null_value() == b {
                debug!("join(null | x, x) => null | x");
                return a.clone();
            }
        }
        if let Some(nullable) = b.as_null_or_abstract_value() {
            if nullable.non_null_value() == a {
                debug!("join(x, null | x) => null | x");
                return b.clone();
            }
        }
        debug!("join({}, {}) => ⊤", a, b);
        AbstractValue::Unknown
    }

    fn join_primitive(
        &self,
        a: &AbstractValue,
        b: &AbstractValue,
        ty: &TypeElement,
        policy: JoinPolicy,
    ) -> AbstractValue {
        if policy.number_set_abstraction {
            if let Some(result) = self.join_number_sets(a, b) {
                debug!("join({}, {}) => {}", a, b, result);
                return result;
            }
        }
        if policy.definite_bits_abstraction && ty.is_int() {
            if let Some(result) = self.join_definite_bits(a, b) {
                debug!("join({}, {}) => {}", a, b, result);
                return result;
            }
        }
        debug!("join({}, {}) => ⊤", a, b);
        AbstractValue::Unknown
    }

    /// Set capability. Declines unless both operands are exact numbers or sets.
    fn join_number_sets(&self, a: &AbstractValue, b: &AbstractValue) -> Option<AbstractValue> {
        let mut builder = match a {
            AbstractValue::SingleNumber(single) => NumberFromSetBuilder::from_single(single),
            AbstractValue::NumberFromSet(set) => set.instance_builder(),
            _ => return None,
        };
        match b {
            AbstractValue::SingleNumber(single) => builder.add_long(single.value()),
            AbstractValue::NumberFromSet(set) => builder.add_ints(set),
            _ => return None,
        };
        Some(builder.build(self.factory))
    }

    /// Bits capability. Declines unless both operands carry per-bit knowledge.
    fn join_definite_bits(&self, a: &AbstractValue, b: &AbstractValue) -> Option<AbstractValue> {
        // Exact numbers sort to the right, so only (bits, bits) and (bits, exact)
        // remain; (exact, exact) is the degenerate case of the latter.
        let (left, right) = match (a, b) {
            (AbstractValue::SingleNumber(_), AbstractValue::DefiniteBitsNumber(_)) => (b, a),
            _ => (a, b),
        };
        let (set, unset) = match (left, right) {
            (AbstractValue::DefiniteBitsNumber(x), AbstractValue::DefiniteBitsNumber(y)) => {
                x.join_bits(y)
            }
            (AbstractValue::DefiniteBitsNumber(x), AbstractValue::SingleNumber(y)) => {
                x.join_single(y)
            }
            (AbstractValue::SingleNumber(x), AbstractValue::SingleNumber(y)) => (
                x.definitely_set_int_bits() & y.definitely_set_int_bits(),
                x.definitely_unset_int_bits() & y.definitely_unset_int_bits(),
            ),
            _ => return None,
        };
        Some(self.factory.create_definite_bits_number_value(set, unset))
    }

    /// Greatest lower bound approximation of `a` and `b` at type `ty`.
    ///
    /// The result keeps every concrete value both inputs may take. When the
    /// intersection has no precise encoding, the input with the smaller
    /// [`abstraction_size`](AbstractValue::abstraction_size) is returned.
    pub fn meet(
        &self,
        a: &AbstractValue,
        b: &AbstractValue,
        ty: &TypeElement,
        policy: JoinPolicy,
    ) -> AbstractValue {
        if a.is_unknown() {
            debug!("meet(⊤, x) => x");
            return b.clone();
        }
        if b.is_unknown() {
            debug!("meet(x, ⊤) => x");
            return a.clone();
        }
        if a.is_bottom() || b.is_bottom() {
            debug!("meet(⊥, x) => ⊥");
            return AbstractValue::Bottom;
        }
        if a == b {
            debug!("meet(x, x) => x");
            return a.clone();
        }
        if &self.join_internal(a, b, ty, policy) == b {
            debug!("meet({}, {}) => {}", a, b, a);
            return a.clone();
        }
        if &self.join_internal(b, a, ty, policy) == a {
            debug!("meet({}, {}) => {}", a, b, b);
            return b.clone();
        }

        let result = self
            .meet_exact(a, b, ty, policy)
            .unwrap_or_else(|| Self::smaller_of(a, b).clone());
        debug!("meet({}, {}) => {}", a, b, result);
        result
    }

    /// Intersection of `a` and `b`, if it has a precise encoding.
    fn meet_exact(
        &self,
        a: &AbstractValue,
        b: &AbstractValue,
        ty: &TypeElement,
        policy: JoinPolicy,
    ) -> Option<AbstractValue> {
        if let (Some(x), Some(y)) = (a.as_number_abstraction(), b.as_number_abstraction()) {
            return self.meet_numbers(x, y);
        }
        match (a, b) {
            (AbstractValue::NullOr(x), AbstractValue::NullOr(y)) => {
                Some(match self.meet(x.non_null_value(), y.non_null_value(), ty, policy) {
                    AbstractValue::Bottom => AbstractValue::SingleNull,
                    inner => NullOrAbstractValue::create(inner),
                })
            }
            (AbstractValue::NullOr(x), other) | (other, AbstractValue::NullOr(x)) => {
                if other.is_null() {
                    Some(AbstractValue::SingleNull)
                } else if x.non_null_value() == other {
                    Some(other.clone())
                } else if other.is_definitely_not_null() {
                    Some(self.meet(x.non_null_value(), other, ty, policy))
                } else {
                    None
                }
            }
            (AbstractValue::SingleNull, other) | (other, AbstractValue::SingleNull) => {
                other.is_definitely_not_null().then_some(AbstractValue::Bottom)
            }
            _ if Self::are_distinct_constants(a, b) => Some(AbstractValue::Bottom),
            _ => None,
        }
    }

    /// Checks if `a` and `b` denote different runtime objects for sure.
    ///
    /// Callers have already ruled out `a == b`.
    fn are_distinct_constants(a: &AbstractValue, b: &AbstractValue) -> bool {
        fn is_constant(value: &AbstractValue) -> bool {
            matches!(
                value,
                AbstractValue::SingleString(_)
                    | AbstractValue::SingleConstClass(_)
                    | AbstractValue::SingleBoxedPrimitive(_)
            ) || value.is_single_enum()
        }

        if let (Some(x), Some(y)) = (a.as_single_enum(), b.as_single_enum()) {
            // Two snapshots of the same constant are the same object.
            return x.field() != y.field();
        }
        is_constant(a) && is_constant(b)
    }

    /// The input describing fewer concrete values; ties break on a fixed order.
    fn smaller_of<'v>(a: &'v AbstractValue, b: &'v AbstractValue) -> &'v AbstractValue {
        fn fingerprint(value: &AbstractValue) -> u64 {
            let mut hasher = DefaultHasher::new();
            value.hash(&mut hasher);
            hasher.finish()
        }

        let order = a
            .abstraction_size()
            .cmp(&b.abstraction_size())
            .then_with(|| a.to_string().cmp(&b.to_string()))
            .then_with(|| fingerprint(a).cmp(&fingerprint(b)));
        match order {
            Ordering::Greater => b,
            Ordering::Less | Ordering::Equal => a,
        }
    }

    /// Exact intersection of two numeric abstractions, if encodable.
    fn meet_numbers(
        &self,
        a: NumberAbstraction<'_>,
        b: NumberAbstraction<'_>,
    ) -> Option<AbstractValue> {
        use NumberAbstraction::*;

        fn rank(n: &NumberAbstraction<'_>) -> u8 {
            match n {
                NumberAbstraction::Single(_) => 0,
                NumberAbstraction::Set(_) => 1,
                NumberAbstraction::Interval(_) => 2,
                NumberAbstraction::DefiniteBits(_) => 3,
            }
        }

        let (a, b) = if rank(&a) <= rank(&b) { (a, b) } else { (b, a) };
        let result = match (a, b) {
            (Single(x), other) => {
                let contained = match other {
                    Interval(interval) => interval.contains_long(x.value()),
                    _ => i32::try_from(x.value()).is_ok_and(|v| other.maybe_contains_int(v)),
                };
                if contained {
                    x.clone().into()
                } else {
                    AbstractValue::Bottom
                }
            }
            (Set(set), other) => {
                let mut builder = NumberFromSetBuilder::new();
                for v in set.iter().filter(|&v| other.maybe_contains_int(v)) {
                    builder.add_int(v);
                }
                builder.build(self.factory)
            }
            (Interval(x), Interval(y)) => match x.intersect(y) {
                Some((min, max)) => self.factory.create_number_from_interval_value(min, max),
                None => AbstractValue::Bottom,
            },
            (Interval(interval), DefiniteBits(bits)) => {
                if interval.abstraction_size() > MAX_SIZE as u64 {
                    return None;
                }
                let min = interval.min_inclusive().max(i32::MIN as i64);
                let max = interval.max_inclusive().min(i32::MAX as i64);
                let mut builder = NumberFromSetBuilder::new();
                for v in min..=max {
                    if bits.maybe_contains_int(v as i32) {
                        builder.add_int(v as i32);
                    }
                }
                builder.build(self.factory)
            }
            (DefiniteBits(x), DefiniteBits(y)) => {
                let set = x.definitely_set_int_bits() | y.definitely_set_int_bits();
                let unset = x.definitely_unset_int_bits() | y.definitely_unset_int_bits();
                if set & unset != 0 {
                    AbstractValue::Bottom
                } else {
                    self.factory.create_definite_bits_number_value(set, unset)
                }
            }
            // Unreachable after ordering by rank.
            _ => return None,
        };
        Some(result)
    }
}

/// Join used when merging values across control-flow paths.
#[derive(Debug, Copy, Clone)]
pub struct ConstantPropagationJoiner<'f> {
    joiner: AbstractValueJoiner<'f>,
}

impl<'f> ConstantPropagationJoiner<'f> {
    pub fn new(joiner: AbstractValueJoiner<'f>) -> Self {
        Self { joiner }
    }

    pub fn join(&self, a: &AbstractValue, b: &AbstractValue, ty: &TypeElement) -> AbstractValue {
        self.joiner.join(a, b, ty, JoinPolicy::CONSTANT_PROPAGATION)
    }

    pub fn less_than_or_equal_to(&self, a: &AbstractValue, b: &AbstractValue, ty: &TypeElement) -> bool {
        self.joiner
            .less_than_or_equal_to(a, b, ty, JoinPolicy::CONSTANT_PROPAGATION)
    }
}

/// Join used when merging a field's value over all its initializers.
///
/// The class-id field ([`DISCRIMINATOR_FIELD_NAME`]) tracks small sets; every
/// other field tracks bits.
#[derive(Debug, Copy, Clone)]
pub struct FieldJoiner<'f> {
    joiner: AbstractValueJoiner<'f>,
}

impl<'f> FieldJoiner<'f> {
    pub fn new(joiner: AbstractValueJoiner<'f>) -> Self {
        Self { joiner }
    }

    pub fn policy(field: &FieldRef) -> JoinPolicy {
        if field.name() == DISCRIMINATOR_FIELD_NAME {
            JoinPolicy::ENUM_DISCRIMINATOR_FIELD
        } else {
            JoinPolicy::STRUCT_FIELD
        }
    }

    pub fn join(&self, a: &AbstractValue, b: &AbstractValue, field: &FieldRef) -> AbstractValue {
        self.joiner
            .join(a, b, &TypeElement::from(&field.ty), Self::policy(field))
    }

    pub fn less_than_or_equal_to(&self, a: &AbstractValue, b: &AbstractValue, field: &FieldRef) -> bool {
        self.joiner
            .less_than_or_equal_to(a, b, &TypeElement::from(&field.ty), Self::policy(field))
    }
}

/// Join used when merging a parameter's incoming values across call sites.
#[derive(Debug, Copy, Clone)]
pub struct ParameterJoiner<'f> {
    joiner: AbstractValueJoiner<'f>,
}

impl<'f> ParameterJoiner<'f> {
    pub fn new(joiner: AbstractValueJoiner<'f>) -> Self {
        Self { joiner }
    }

    pub fn join(&self, a: &AbstractValue, b: &AbstractValue, ty: &TypeElement) -> AbstractValue {
        self.joiner.join(a, b, ty, JoinPolicy::PARAMETER)
    }

    pub fn less_than_or_equal_to(&self, a: &AbstractValue, b: &AbstractValue, ty: &TypeElement) -> bool {
        self.joiner.less_than_or_equal_to(a, b, ty, JoinPolicy::PARAMETER)
    }
}

impl<'f> AbstractValueJoiner<'f> {
    pub fn constant_propagation(&self) -> ConstantPropagationJoiner<'f> {
        ConstantPropagationJoiner::new(*self)
    }

    pub fn field(&self) -> FieldJoiner<'f> {
        FieldJoiner::new(*self)
    }

    pub fn parameter(&self) -> ParameterJoiner<'f> {
        ParameterJoiner::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_state::ObjectState;
    use crate::types::{PrimitiveKind, TypeRef};
    use test_log::test;

    fn string_type() -> TypeElement {
        TypeElement::reference("Ljava/lang/String;")
    }

    fn sample_values(factory: &AbstractValueFactory) -> Vec<AbstractValue> {
        vec![
            AbstractValue::Bottom,
            AbstractValue::Unknown,
            AbstractValue::SingleNull,
            factory.create_single_number_value(0).into(),
            factory.create_single_number_value(5).into(),
            factory.create_single_number_value(6).into(),
            factory.create_single_number_value(-1).into(),
            factory.create_single_number_value(1 << 40).into(),
            factory.create_number_from_set_value([1, 2, 3]),
            factory.create_number_from_set_value([5, 6]),
            factory.create_number_from_interval_value(0, 9),
            factory.create_definite_bits_number_value(0b100, 0xFFFF_FF00),
            factory.create_definite_bits_number_value(0b1, 0b10),
            factory.create_single_string_value("a").into(),
            factory.create_single_string_value("b").into(),
            factory.create_null_or_abstract_value(factory.create_single_string_value("a").into()),
            factory.create_single_const_class_value(TypeRef::class("a.B")).into(),
            factory
                .create_single_boxed_primitive_value(PrimitiveKind::Boolean, 1)
                .into(),
            factory.create_known_length_array_value(3),
        ]
    }

    #[test]
    fn test_join_same_number() {
        let factory = AbstractValueFactory::new();
        let joiner = AbstractValueJoiner::new(&factory);
        let five: AbstractValue = factory.create_single_number_value(5).into();
        let result = joiner.join(&five, &five.clone(), &TypeElement::int(), JoinPolicy::CONSTANT_PROPAGATION);
        assert_eq!(result, five);
    }

    #[test]
    fn test_join_numbers_keeps_common_bits() {
        let factory = AbstractValueFactory::new();
        let joiner = AbstractValueJoiner::new(&factory);
        let five: AbstractValue = factory.create_single_number_value(5).into();
        let six: AbstractValue = factory.create_single_number_value(6).into();

        let result = joiner.join(&five, &six, &TypeElement::int(), JoinPolicy::CONSTANT_PROPAGATION);
        let bits = result.as_definite_bits_number().expect("expected a bit abstraction");
        assert_eq!(bits.definitely_set_int_bits(), 0b100);
        assert_eq!(bits.definitely_unset_int_bits() & 0b111, 0);
        assert_eq!(bits.definitely_unset_int_bits(), !0b111);
        assert!(result.maybe_contains_int(5));
        assert!(result.maybe_contains_int(6));
        assert!(!result.maybe_contains_int(8));
    }

    #[test]
    fn test_join_bits_only_for_int() {
        let factory = AbstractValueFactory::new();
        let joiner = AbstractValueJoiner::new(&factory);
        let five: AbstractValue = factory.create_single_number_value(5).into();
        let six: AbstractValue = factory.create_single_number_value(6).into();
        let long = TypeElement::Primitive(PrimitiveKind::Long);
        assert!(joiner.join(&five, &six, &long, JoinPolicy::CONSTANT_PROPAGATION).is_unknown());
    }

    #[test]
    fn test_join_discriminator_builds_set() {
        let factory = AbstractValueFactory::new();
        let joiner = AbstractValueJoiner::new(&factory);
        let one: AbstractValue = factory.create_single_number_value(1).into();
        let two: AbstractValue = factory.create_single_number_value(2).into();
        let three: AbstractValue = factory.create_single_number_value(3).into();
        let policy = JoinPolicy::ENUM_DISCRIMINATOR_FIELD;

        let set = joiner.join(&one, &two, &TypeElement::int(), policy);
        assert_eq!(set, factory.create_number_from_set_value([1, 2]));

        let set = joiner.join(&set, &three, &TypeElement::int(), policy);
        assert_eq!(set, factory.create_number_from_set_value([1, 2, 3]));

        let bits = factory.create_definite_bits_number_value(1, 0);
        assert!(joiner.join(&one, &bits, &TypeElement::int(), policy).is_unknown());
    }

    #[test]
    fn test_join_discriminator_overflow() {
        let factory = AbstractValueFactory::new();
        let joiner = AbstractValueJoiner::new(&factory);
        let policy = JoinPolicy::ENUM_DISCRIMINATOR_FIELD;

        let full = factory.create_number_from_set_value(0..MAX_SIZE as i32);
        let next: AbstractValue = factory.create_single_number_value(MAX_SIZE as i64).into();
        assert!(joiner.join(&full, &next, &TypeElement::int(), policy).is_unknown());
    }

    #[test]
    fn test_join_null_with_string() {
        let factory = AbstractValueFactory::new();
        let joiner = AbstractValueJoiner::new(&factory);
        let x: AbstractValue = factory.create_single_string_value("x").into();
        let null = AbstractValue::null();

        let result = joiner.join(&null, &x, &string_type(), JoinPolicy::CONSTANT_PROPAGATION);
        assert_eq!(result, factory.create_null_or_abstract_value(x.clone()));
        assert_eq!(result.to_string(), "null | \"x\"");

        let again = joiner.join(&result, &x, &string_type(), JoinPolicy::CONSTANT_PROPAGATION);
        assert_eq!(again, result);
        let again = joiner.join(&null, &result, &string_type(), JoinPolicy::CONSTANT_PROPAGATION);
        assert_eq!(again, result);
    }

    #[test]
    fn test_join_distinct_strings() {
        let factory = AbstractValueFactory::new();
        let joiner = AbstractValueJoiner::new(&factory);
        let a: AbstractValue = factory.create_single_string_value("a").into();
        let b: AbstractValue = factory.create_single_string_value("b").into();
        assert!(joiner
            .join(&a, &b, &string_type(), JoinPolicy::CONSTANT_PROPAGATION)
            .is_unknown());
    }

    #[test]
    fn test_join_identity_and_absorption() {
        let factory = AbstractValueFactory::new();
        let joiner = AbstractValueJoiner::new(&factory);
        for ty in [TypeElement::int(), string_type()] {
            for x in sample_values(&factory) {
                let policy = JoinPolicy::CONSTANT_PROPAGATION;
                assert_eq!(joiner.join(&AbstractValue::Bottom, &x, &ty, policy), x);
                assert_eq!(joiner.join(&x, &AbstractValue::Bottom, &ty, policy), x);
                assert!(joiner.join(&AbstractValue::Unknown, &x, &ty, policy).is_unknown());
                assert!(joiner.join(&x, &AbstractValue::Unknown, &ty, policy).is_unknown());
                assert_eq!(joiner.join(&x, &x, &ty, policy), x);
            }
        }
    }

    #[test]
    fn test_join_is_commutative_and_upper_bound() {
        let factory = AbstractValueFactory::new();
        let joiner = AbstractValueJoiner::with_options(
            &factory,
            JoinerOptions {
                check_commutativity: false,
            },
        );
        let values = sample_values(&factory);
        let policies = [
            JoinPolicy::CONSTANT_PROPAGATION,
            JoinPolicy::ENUM_DISCRIMINATOR_FIELD,
            JoinPolicy {
                number_set_abstraction: true,
                definite_bits_abstraction: true,
            },
        ];
        for ty in [TypeElement::int(), string_type()] {
            for policy in policies {
                for a in &values {
                    for b in &values {
                        let ab = joiner.join(a, b, &ty, policy);
                        let ba = joiner.join(b, a, &ty, policy);
                        assert_eq!(ab, ba, "join({}, {}) at {}", a, b, ty);
                        assert!(joiner.less_than_or_equal_to(a, &ab, &ty, policy), "{} <= {}", a, ab);
                        assert!(joiner.less_than_or_equal_to(b, &ab, &ty, policy), "{} <= {}", b, ab);
                    }
                }
            }
        }
    }

    #[test]
    fn test_field_joiner_selects_policy() {
        let factory = AbstractValueFactory::new();
        let joiner = AbstractValueJoiner::new(&factory).field();
        let holder = TypeRef::class("a.Merged");
        let class_id = FieldRef::new(holder.clone(), DISCRIMINATOR_FIELD_NAME, TypeRef::new("I"));
        let other = FieldRef::new(holder, "flags", TypeRef::new("I"));
        assert_eq!(FieldJoiner::policy(&class_id), JoinPolicy::ENUM_DISCRIMINATOR_FIELD);
        assert_eq!(FieldJoiner::policy(&other), JoinPolicy::STRUCT_FIELD);

        let one: AbstractValue = factory.create_single_number_value(1).into();
        let two: AbstractValue = factory.create_single_number_value(2).into();
        assert!(joiner.join(&one, &two, &class_id).is_number_from_set());
        assert!(joiner.join(&one, &two, &other).is_definite_bits_number());
    }

    #[test]
    fn test_parameter_joiner_matches_constant_propagation() {
        let factory = AbstractValueFactory::new();
        let joiner = AbstractValueJoiner::new(&factory);
        let values = sample_values(&factory);
        for a in &values {
            for b in &values {
                assert_eq!(
                    joiner.parameter().join(a, b, &TypeElement::int()),
                    joiner.constant_propagation().join(a, b, &TypeElement::int())
                );
            }
        }
    }

    #[test]
    fn test_field_values_join_at_reference_type() {
        let factory = AbstractValueFactory::new();
        let joiner = AbstractValueJoiner::new(&factory);
        let holder = TypeRef::class("a.Color");
        let red = FieldRef::new(holder.clone(), "RED", holder.clone());
        let red: AbstractValue = factory.create_single_enum_value(red, ObjectState::Empty).into();
        let ty = TypeElement::Reference(holder);

        let nullable = joiner.join(&red, &AbstractValue::null(), &ty, JoinPolicy::CONSTANT_PROPAGATION);
        assert!(nullable.is_null_or_abstract_value());
        assert!(nullable.is_maybe_null());
        assert!(joiner.less_than_or_equal_to(&red, &nullable, &ty, JoinPolicy::CONSTANT_PROPAGATION));
    }

    #[test]
    fn test_meet_numbers() {
        let factory = AbstractValueFactory::new();
        let joiner = AbstractValueJoiner::new(&factory);
        let ty = TypeElement::int();
        let policy = JoinPolicy::CONSTANT_PROPAGATION;

        let set = factory.create_number_from_set_value([1, 2, 3, 8]);
        let interval = factory.create_number_from_interval_value(2, 10);
        assert_eq!(
            joiner.meet(&set, &interval, &ty, policy),
            factory.create_number_from_set_value([2, 3, 8])
        );

        let other = factory.create_number_from_interval_value(8, 20);
        assert_eq!(
            joiner.meet(&interval, &other, &ty, policy),
            factory.create_number_from_interval_value(8, 10)
        );

        let far = factory.create_number_from_interval_value(100, 200);
        assert!(joiner.meet(&interval, &far, &ty, policy).is_bottom());

        // Even numbers only.
        let even = factory.create_definite_bits_number_value(0, 1);
        assert_eq!(
            joiner.meet(&set, &even, &ty, policy),
            factory.create_number_from_set_value([2, 8])
        );
        assert_eq!(
            joiner.meet(&interval, &even, &ty, policy),
            factory.create_number_from_set_value([2, 4, 6, 8, 10])
        );

        let odd = factory.create_definite_bits_number_value(1, 0);
        assert!(joiner.meet(&even, &odd, &ty, policy).is_bottom());

        let four: AbstractValue = factory.create_single_number_value(4).into();
        assert_eq!(joiner.meet(&four, &even, &ty, policy), four);
        assert!(joiner.meet(&four, &odd, &ty, policy).is_bottom());

        // Too wide to enumerate: the interval is the smaller input.
        let wide = factory.create_number_from_interval_value(0, 100);
        let narrowed = joiner.meet(&wide, &even, &ty, policy);
        assert_eq!(narrowed, wide);
        assert_eq!(joiner.meet(&even, &wide, &ty, policy), narrowed);
        assert!(narrowed.maybe_contains_int(2));
        assert!(narrowed.maybe_contains_int(100));
    }

    #[test]
    fn test_meet_trivial_and_nullable() {
        let factory = AbstractValueFactory::new();
        let joiner = AbstractValueJoiner::new(&factory);
        let ty = string_type();
        let policy = JoinPolicy::CONSTANT_PROPAGATION;
        let x: AbstractValue = factory.create_single_string_value("x").into();
        let y: AbstractValue = factory.create_single_string_value("y").into();
        let null_or_x = factory.create_null_or_abstract_value(x.clone());

        assert_eq!(joiner.meet(&AbstractValue::Unknown, &x, &ty, policy), x);
        assert!(joiner.meet(&AbstractValue::Bottom, &x, &ty, policy).is_bottom());
        assert_eq!(joiner.meet(&null_or_x, &x, &ty, policy), x);
        assert_eq!(joiner.meet(&x, &null_or_x, &ty, policy), x);
        assert!(joiner.meet(&null_or_x, &AbstractValue::null(), &ty, policy).is_null());
        assert!(joiner.meet(&x, &y, &ty, policy).is_bottom());
    }

    #[test]
    fn test_meet_keeps_values_of_unrelated_references() {
        let factory = AbstractValueFactory::new();
        let joiner = AbstractValueJoiner::new(&factory);
        let ty = string_type();
        let policy = JoinPolicy::CONSTANT_PROPAGATION;
        let holder = TypeRef::class("a.C");
        let name = FieldRef::new(holder.clone(), "NAME", TypeRef::class("java.lang.String"));
        let field_value: AbstractValue =
            factory.create_single_field_value(name, ObjectState::Empty).into();
        let x: AbstractValue = factory.create_single_string_value("x").into();

        // The field may hold "x".
        assert_eq!(joiner.meet(&field_value, &x, &ty, policy), x);
        assert_eq!(joiner.meet(&x, &field_value, &ty, policy), x);
        // It may also hold null.
        assert!(joiner.meet(&field_value, &AbstractValue::null(), &ty, policy).is_null());
        let array = factory.create_known_length_array_value(3);
        let either = joiner.meet(&field_value, &array, &ty, policy);
        assert!(!either.is_bottom());
        assert_eq!(joiner.meet(&array, &field_value, &ty, policy), either);

        let colors = TypeRef::class("a.Color");
        let red: AbstractValue = factory
            .create_single_enum_value(FieldRef::new(colors.clone(), "RED", colors.clone()), ObjectState::Empty)
            .into();
        let blue: AbstractValue = factory
            .create_single_enum_value(FieldRef::new(colors.clone(), "BLUE", colors), ObjectState::Empty)
            .into();
        assert!(joiner.meet(&red, &blue, &ty, policy).is_bottom());
        assert!(joiner.meet(&red, &AbstractValue::null(), &ty, policy).is_bottom());
        let null_or_x = factory.create_null_or_abstract_value(x.clone());
        assert!(joiner.meet(&null_or_x, &red, &ty, policy).is_bottom());
        assert!(joiner.meet(&null_or_x, &field_value, &ty, policy).is_null_or_abstract_value());
    }

    #[test]
    fn test_meet_is_commutative_and_lower_bound() {
        let factory = AbstractValueFactory::new();
        let joiner = AbstractValueJoiner::new(&factory);
        let mut values = sample_values(&factory);
        let holder = TypeRef::class("a.C");
        let name = FieldRef::new(holder.clone(), "NAME", TypeRef::class("java.lang.String"));
        let constant = FieldRef::new(holder.clone(), "ONE", holder);
        values.push(factory.create_single_field_value(name, ObjectState::Empty).into());
        values.push(factory.create_single_enum_value(constant, ObjectState::Empty).into());
        values.push(factory.create_number_from_interval_value(-50, 50));
        values.push(factory.create_definite_bits_number_value(0, 1));

        let ints: Vec<i32> = (-60..=60).chain([255, 256, i32::MIN, i32::MAX]).collect();
        for ty in [TypeElement::int(), string_type()] {
            let policy = JoinPolicy::CONSTANT_PROPAGATION;
            for a in &values {
                for b in &values {
                    let ab = joiner.meet(a, b, &ty, policy);
                    let ba = joiner.meet(b, a, &ty, policy);
                    assert_eq!(ab, ba, "meet({}, {}) at {}", a, b, ty);

                    if a.is_constant_or_non_constant_number() && b.is_constant_or_non_constant_number() {
                        for &v in &ints {
                            if a.maybe_contains_int(v) && b.maybe_contains_int(v) {
                                assert!(ab.maybe_contains_int(v), "meet({}, {}) = {} drops {}", a, b, ab, v);
                            }
                        }
                    }
                    // Non-constant references can always share a value.
                    if a.is_single_field() && !a.is_single_enum() && !b.is_bottom() {
                        assert!(!ab.is_bottom(), "meet({}, {}) at {}", a, b, ty);
                    }
                }
            }
        }
    }
}
