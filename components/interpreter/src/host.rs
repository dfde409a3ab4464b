//! The value/heap collaborator contract.
//!
//! The VM owns fetch, dispatch and control transfer; every object, scope
//! and call semantic is delegated through this trait. Handlers never reach
//! into a value's representation — classification predicates and operators
//! are part of the contract instead. Errors travel as exceptional values:
//! any operation that can fail returns a value for which
//! [`Host::is_exception`] answers true.

use crate::context::EvalContext;
use core_types::{ErrorKind, StackFrame};

/// The embedding collaborator the VM evaluates against.
pub trait Host {
    /// Opaque value handle. Cloning a handle never clones the underlying
    /// object; handles are reference-like.
    type Value: Clone;

    // -- value constructors --

    /// The undefined value.
    fn undefined(&mut self) -> Self::Value;
    /// The null value.
    fn null(&mut self) -> Self::Value;
    /// A boolean value.
    fn boolean(&mut self, value: bool) -> Self::Value;
    /// A number value.
    fn number(&mut self, value: f64) -> Self::Value;
    /// A string value.
    fn string(&mut self, value: &str) -> Self::Value;
    /// A big integer parsed from decimal digits; exceptional on bad input.
    fn bigint(&mut self, digits: &str) -> Self::Value;
    /// The marker stored in `let`/`const` slots before initialization.
    fn uninitialized(&mut self) -> Self::Value;
    /// A fresh empty object.
    fn object(&mut self) -> Self::Value;
    /// A fresh empty array.
    fn array(&mut self) -> Self::Value;
    /// A plain function value entered at `entry` of the program at `path`.
    fn function(&mut self, path: &str, entry: usize) -> Self::Value;
    /// A generator function value.
    fn generator_function(&mut self, path: &str, entry: usize) -> Self::Value;
    /// A new exceptional value.
    fn exception(&mut self, kind: ErrorKind, message: &str) -> Self::Value;
    /// Wrap a thrown value as an exceptional value.
    fn throw(&mut self, value: Self::Value) -> Self::Value;
    /// Unwrap the payload of an exceptional value for a catch binding.
    fn caught(&mut self, exception: &Self::Value) -> Self::Value;
    /// Capture a paused evaluation as an interrupt value (`yield`).
    fn interrupt(&mut self, context: EvalContext<Self::Value>, value: Self::Value)
        -> Self::Value;

    // -- classification --

    /// True for exceptional values.
    fn is_exception(&self, value: &Self::Value) -> bool;
    /// True for interrupt values produced by [`Host::interrupt`].
    fn is_interrupt(&self, value: &Self::Value) -> bool;
    /// True for null-ish values (null and undefined).
    fn is_null(&self, value: &Self::Value) -> bool;
    /// True for callable values.
    fn is_callable(&self, value: &Self::Value) -> bool;
    /// True when both values share a type, for the strict comparisons.
    fn same_kind(&self, left: &Self::Value, right: &Self::Value) -> bool;
    /// Read a boolean produced by [`Host::to_boolean`].
    fn boolean_value(&self, value: &Self::Value) -> bool;
    /// Read a number for argument counts.
    fn number_value(&self, value: &Self::Value) -> f64;

    // -- scope chain --

    /// Enter a lexical scope.
    fn push_scope(&mut self);
    /// Leave the innermost lexical scope.
    fn pop_scope(&mut self);
    /// Current scope chain depth, used as an unwinding watermark.
    fn scope_depth(&self) -> usize;
    /// Declare a binding in the innermost scope.
    fn define(&mut self, name: &str, value: Self::Value);
    /// Declare an immutable binding in the innermost scope.
    fn define_immutable(&mut self, name: &str, value: Self::Value);
    /// Look a name up through the scope chain; exceptional when missing.
    fn lookup(&mut self, name: &str) -> Self::Value;
    /// Assign a named binding; exceptional when missing or immutable.
    fn assign(&mut self, name: &str, value: Self::Value) -> Self::Value;

    // -- object access --

    /// Read a field.
    fn get_field(&mut self, object: Self::Value, field: Self::Value) -> Self::Value;
    /// Write a field, returning the stored value or an exception.
    fn set_field(
        &mut self,
        object: Self::Value,
        field: Self::Value,
        value: Self::Value,
    ) -> Self::Value;
    /// Install an accessor on an object.
    fn set_accessor(
        &mut self,
        object: Self::Value,
        field: Self::Value,
        accessor: Self::Value,
        getter: bool,
    ) -> Self::Value;
    /// The well-known iterator key.
    fn iterator_key(&mut self) -> Self::Value;

    // -- calls --

    /// Invoke a callable.
    fn call(
        &mut self,
        callee: Self::Value,
        this: Self::Value,
        arguments: Vec<Self::Value>,
    ) -> Self::Value;
    /// Construct an instance.
    fn construct(&mut self, callee: Self::Value, arguments: Vec<Self::Value>) -> Self::Value;
    /// Display name of a callable, resolved lazily for diagnostics.
    fn function_name(&self, callee: &Self::Value) -> Option<String>;
    /// Set the display name of a callable.
    fn set_function_name(&mut self, callee: &Self::Value, name: &str);
    /// Capture the current binding of `name` into a callable's closure
    /// reference table.
    fn bind_closure(&mut self, callee: &Self::Value, name: &str) -> Self::Value;

    // -- diagnostics --

    /// Push a diagnostic call-stack frame.
    fn push_call_frame(&mut self, frame: StackFrame);
    /// Pop the innermost diagnostic frame.
    fn pop_call_frame(&mut self);

    // -- conversions and operators --

    /// Truthiness conversion; the result is a boolean or an exception.
    fn to_boolean(&mut self, value: &Self::Value) -> Self::Value;
    /// `typeof` name of a value.
    fn type_name(&mut self, value: &Self::Value) -> String;
    /// Copy a value (postfix update keeps the old one).
    fn copy(&mut self, value: &Self::Value) -> Self::Value;
    /// Addition, with the language's coercions.
    fn add(&mut self, left: Self::Value, right: Self::Value) -> Self::Value;
    /// Subtraction.
    fn sub(&mut self, left: Self::Value, right: Self::Value) -> Self::Value;
    /// Multiplication.
    fn mul(&mut self, left: Self::Value, right: Self::Value) -> Self::Value;
    /// Division.
    fn div(&mut self, left: Self::Value, right: Self::Value) -> Self::Value;
    /// Remainder.
    fn rem(&mut self, left: Self::Value, right: Self::Value) -> Self::Value;
    /// Exponentiation.
    fn pow(&mut self, left: Self::Value, right: Self::Value) -> Self::Value;
    /// Bitwise and.
    fn bit_and(&mut self, left: Self::Value, right: Self::Value) -> Self::Value;
    /// Bitwise or.
    fn bit_or(&mut self, left: Self::Value, right: Self::Value) -> Self::Value;
    /// Bitwise xor.
    fn bit_xor(&mut self, left: Self::Value, right: Self::Value) -> Self::Value;
    /// Bitwise not.
    fn bit_not(&mut self, value: Self::Value) -> Self::Value;
    /// Left shift.
    fn shl(&mut self, left: Self::Value, right: Self::Value) -> Self::Value;
    /// Signed right shift.
    fn shr(&mut self, left: Self::Value, right: Self::Value) -> Self::Value;
    /// Loose equality.
    fn equal(&mut self, left: Self::Value, right: Self::Value) -> Self::Value;
    /// Less than.
    fn less(&mut self, left: Self::Value, right: Self::Value) -> Self::Value;
    /// Greater than.
    fn greater(&mut self, left: Self::Value, right: Self::Value) -> Self::Value;
    /// Less than or equal.
    fn less_equal(&mut self, left: Self::Value, right: Self::Value) -> Self::Value;
    /// Greater than or equal.
    fn greater_equal(&mut self, left: Self::Value, right: Self::Value) -> Self::Value;
    /// Numeric coercion (unary plus).
    fn unary_plus(&mut self, value: Self::Value) -> Self::Value;
    /// Numeric negation.
    fn unary_neg(&mut self, value: Self::Value) -> Self::Value;
    /// Increment.
    fn inc(&mut self, value: Self::Value) -> Self::Value;
    /// Decrement.
    fn dec(&mut self, value: Self::Value) -> Self::Value;
}
