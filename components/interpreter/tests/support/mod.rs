//! A minimal host used by the interpreter integration tests.
//!
//! Values are reference-like handles over a tagged data enum; the scope
//! chain is a vector of binding maps with function-call barriers. This is
//! deliberately not a production heap: no prototypes, no accessors beyond
//! storage, arrays as plain keyed objects.

use core_types::{ErrorKind, StackFrame};
use interpreter::{EvalContext, Host, VirtualMachine};
use num_bigint::BigInt;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Clone)]
pub struct Value(pub Rc<RefCell<Data>>);

impl Value {
    fn new(data: Data) -> Self {
        Self(Rc::new(RefCell::new(data)))
    }

    pub fn data(&self) -> Data {
        self.0.borrow().clone()
    }

    pub fn as_number(&self) -> Option<f64> {
        match &*self.0.borrow() {
            Data::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match &*self.0.borrow() {
            Data::String(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match &*self.0.borrow() {
            Data::Boolean(value) => Some(*value),
            _ => None,
        }
    }
}

pub struct FunctionData {
    pub name: RefCell<String>,
    pub path: String,
    pub entry: usize,
    pub generator: bool,
    pub closure: RefCell<HashMap<String, Value>>,
    /// Scope chain at the function's creation site.
    home: Rc<ScopeNode>,
}

#[derive(Clone)]
pub enum Data {
    Undefined,
    Null,
    Uninitialized,
    Boolean(bool),
    Number(f64),
    String(String),
    BigInt(BigInt),
    Object(Rc<RefCell<HashMap<String, Value>>>),
    Function(Rc<FunctionData>),
    Exception(Box<Value>),
    Interrupt(Rc<RefCell<(EvalContext<Value>, Value)>>),
}

impl Data {
    fn kind(&self) -> u8 {
        match self {
            Data::Undefined => 0,
            Data::Null => 1,
            Data::Uninitialized => 2,
            Data::Boolean(_) => 3,
            Data::Number(_) => 4,
            Data::String(_) => 5,
            Data::BigInt(_) => 6,
            Data::Object(_) => 7,
            Data::Function(_) => 8,
            Data::Exception(_) => 9,
            Data::Interrupt(_) => 10,
        }
    }
}

#[derive(Clone)]
struct Binding {
    cell: Value,
    mutable: bool,
}

/// One link of the lexical scope chain. Functions keep their creation
/// chain alive through `FunctionData::home`, so captured bindings outlive
/// the scopes that introduced them.
pub struct ScopeNode {
    bindings: RefCell<HashMap<String, Binding>>,
    parent: Option<Rc<ScopeNode>>,
}

impl ScopeNode {
    fn child(parent: &Rc<ScopeNode>) -> Rc<ScopeNode> {
        Rc::new(ScopeNode {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        })
    }
}

pub struct TestHost {
    program: Rc<bytecode_system::Program>,
    current: Rc<ScopeNode>,
    depth: usize,
    call_stack: Vec<StackFrame>,
    /// Call stack captured when the most recent exception was created.
    pub error_stack: Vec<StackFrame>,
}

impl TestHost {
    pub fn new(program: Rc<bytecode_system::Program>) -> Self {
        Self {
            program,
            current: Rc::new(ScopeNode {
                bindings: RefCell::new(HashMap::new()),
                parent: None,
            }),
            depth: 1,
            call_stack: Vec::new(),
            error_stack: Vec::new(),
        }
    }

    fn find_binding(&self, name: &str) -> Option<Binding> {
        let mut scope = Some(self.current.clone());
        while let Some(node) = scope {
            if let Some(binding) = node.bindings.borrow().get(name) {
                return Some(binding.clone());
            }
            scope = node.parent.clone();
        }
        None
    }

    fn key_of(&self, field: &Value) -> String {
        match &*field.0.borrow() {
            Data::String(text) => text.clone(),
            Data::Number(value) => {
                if value.fract() == 0.0 && value.is_finite() {
                    format!("{}", *value as i64)
                } else {
                    format!("{}", value)
                }
            }
            Data::Boolean(value) => format!("{}", value),
            Data::Null => "null".to_string(),
            _ => "undefined".to_string(),
        }
    }

    fn truthy(&self, value: &Value) -> bool {
        match &*value.0.borrow() {
            Data::Undefined | Data::Null | Data::Uninitialized => false,
            Data::Boolean(value) => *value,
            Data::Number(value) => *value != 0.0 && !value.is_nan(),
            Data::String(text) => !text.is_empty(),
            Data::BigInt(value) => *value != BigInt::from(0),
            _ => true,
        }
    }

    fn numeric(&mut self, value: &Value) -> Option<f64> {
        match &*value.0.borrow() {
            Data::Number(number) => Some(*number),
            Data::Boolean(true) => Some(1.0),
            Data::Boolean(false) => Some(0.0),
            _ => None,
        }
    }

    fn type_error(&mut self, message: &str) -> Value {
        self.exception(ErrorKind::TypeError, message)
    }

    fn numeric_binary(
        &mut self,
        left: Value,
        right: Value,
        operation: fn(f64, f64) -> f64,
    ) -> Value {
        match (self.numeric(&left), self.numeric(&right)) {
            (Some(left), Some(right)) => Value::new(Data::Number(operation(left, right))),
            _ => self.type_error("operand is not a number"),
        }
    }

    fn integer_binary(
        &mut self,
        left: Value,
        right: Value,
        operation: fn(i64, i64) -> i64,
    ) -> Value {
        match (self.numeric(&left), self.numeric(&right)) {
            (Some(left), Some(right)) => {
                Value::new(Data::Number(operation(left as i64, right as i64) as f64))
            }
            _ => self.type_error("operand is not a number"),
        }
    }

    fn compare(&mut self, left: Value, right: Value, operation: fn(f64, f64) -> bool) -> Value {
        let result = match (&*left.0.borrow(), &*right.0.borrow()) {
            (Data::Number(left), Data::Number(right)) => operation(*left, *right),
            (Data::String(left), Data::String(right)) => {
                let ordering = left.cmp(right);
                operation(
                    match ordering {
                        std::cmp::Ordering::Less => -1.0,
                        std::cmp::Ordering::Equal => 0.0,
                        std::cmp::Ordering::Greater => 1.0,
                    },
                    0.0,
                )
            }
            _ => false,
        };
        Value::new(Data::Boolean(result))
    }
}

impl Host for TestHost {
    type Value = Value;

    fn undefined(&mut self) -> Value {
        Value::new(Data::Undefined)
    }

    fn null(&mut self) -> Value {
        Value::new(Data::Null)
    }

    fn boolean(&mut self, value: bool) -> Value {
        Value::new(Data::Boolean(value))
    }

    fn number(&mut self, value: f64) -> Value {
        Value::new(Data::Number(value))
    }

    fn string(&mut self, value: &str) -> Value {
        Value::new(Data::String(value.to_string()))
    }

    fn bigint(&mut self, digits: &str) -> Value {
        match digits.parse::<BigInt>() {
            Ok(value) => Value::new(Data::BigInt(value)),
            Err(_) => self.exception(ErrorKind::SyntaxError, "invalid BigInt literal"),
        }
    }

    fn uninitialized(&mut self) -> Value {
        Value::new(Data::Uninitialized)
    }

    fn object(&mut self) -> Value {
        Value::new(Data::Object(Rc::new(RefCell::new(HashMap::new()))))
    }

    fn array(&mut self) -> Value {
        self.object()
    }

    fn function(&mut self, path: &str, entry: usize) -> Value {
        Value::new(Data::Function(Rc::new(FunctionData {
            name: RefCell::new(String::new()),
            path: path.to_string(),
            entry,
            generator: false,
            closure: RefCell::new(HashMap::new()),
            home: self.current.clone(),
        })))
    }

    fn generator_function(&mut self, path: &str, entry: usize) -> Value {
        Value::new(Data::Function(Rc::new(FunctionData {
            name: RefCell::new(String::new()),
            path: path.to_string(),
            entry,
            generator: true,
            closure: RefCell::new(HashMap::new()),
            home: self.current.clone(),
        })))
    }

    fn exception(&mut self, kind: ErrorKind, message: &str) -> Value {
        self.error_stack = self.call_stack.clone();
        let payload = Value::new(Data::String(format!("{}: {}", kind.name(), message)));
        Value::new(Data::Exception(Box::new(payload)))
    }

    fn throw(&mut self, value: Value) -> Value {
        self.error_stack = self.call_stack.clone();
        Value::new(Data::Exception(Box::new(value)))
    }

    fn caught(&mut self, exception: &Value) -> Value {
        match &*exception.0.borrow() {
            Data::Exception(payload) => (**payload).clone(),
            _ => exception.clone(),
        }
    }

    fn interrupt(&mut self, context: EvalContext<Value>, value: Value) -> Value {
        Value::new(Data::Interrupt(Rc::new(RefCell::new((context, value)))))
    }

    fn is_exception(&self, value: &Value) -> bool {
        matches!(&*value.0.borrow(), Data::Exception(_))
    }

    fn is_interrupt(&self, value: &Value) -> bool {
        matches!(&*value.0.borrow(), Data::Interrupt(_))
    }

    fn is_null(&self, value: &Value) -> bool {
        matches!(
            &*value.0.borrow(),
            Data::Null | Data::Undefined | Data::Uninitialized
        )
    }

    fn is_callable(&self, value: &Value) -> bool {
        matches!(&*value.0.borrow(), Data::Function(_))
    }

    fn same_kind(&self, left: &Value, right: &Value) -> bool {
        left.0.borrow().kind() == right.0.borrow().kind()
    }

    fn boolean_value(&self, value: &Value) -> bool {
        matches!(&*value.0.borrow(), Data::Boolean(true))
    }

    fn number_value(&self, value: &Value) -> f64 {
        match &*value.0.borrow() {
            Data::Number(value) => *value,
            _ => 0.0,
        }
    }

    fn push_scope(&mut self) {
        self.current = ScopeNode::child(&self.current);
        self.depth += 1;
    }

    fn pop_scope(&mut self) {
        if let Some(parent) = self.current.parent.clone() {
            self.current = parent;
            self.depth -= 1;
        }
    }

    fn scope_depth(&self) -> usize {
        self.depth
    }

    fn define(&mut self, name: &str, value: Value) {
        self.current.bindings.borrow_mut().insert(
            name.to_string(),
            Binding {
                cell: value,
                mutable: true,
            },
        );
    }

    fn define_immutable(&mut self, name: &str, value: Value) {
        self.current.bindings.borrow_mut().insert(
            name.to_string(),
            Binding {
                cell: value,
                mutable: false,
            },
        );
    }

    fn lookup(&mut self, name: &str) -> Value {
        match self.find_binding(name) {
            Some(binding) => binding.cell,
            None => self.exception(
                ErrorKind::ReferenceError,
                &format!("{} is not defined", name),
            ),
        }
    }

    fn assign(&mut self, name: &str, value: Value) -> Value {
        let Some(binding) = self.find_binding(name) else {
            return self.exception(
                ErrorKind::ReferenceError,
                &format!("{} is not defined", name),
            );
        };
        let initialized = !matches!(&*binding.cell.0.borrow(), Data::Uninitialized);
        if !binding.mutable && initialized {
            return self.type_error("Assignment to constant variable.");
        }
        let data = value.0.borrow().clone();
        *binding.cell.0.borrow_mut() = data;
        binding.cell
    }

    fn get_field(&mut self, object: Value, field: Value) -> Value {
        let key = self.key_of(&field);
        match &*object.0.borrow() {
            Data::Object(map) => map
                .borrow()
                .get(&key)
                .cloned()
                .unwrap_or_else(|| Value::new(Data::Undefined)),
            _ => self.type_error("cannot read fields of a non-object"),
        }
    }

    fn set_field(&mut self, object: Value, field: Value, value: Value) -> Value {
        let key = self.key_of(&field);
        // Fields hold their own cell; only object identity is shared.
        let stored = Value::new(value.0.borrow().clone());
        match &*object.0.borrow() {
            Data::Object(map) => {
                map.borrow_mut().insert(key, stored);
                value
            }
            _ => self.type_error("cannot write fields of a non-object"),
        }
    }

    fn set_accessor(
        &mut self,
        object: Value,
        field: Value,
        accessor: Value,
        _getter: bool,
    ) -> Value {
        self.set_field(object, field, accessor)
    }

    fn iterator_key(&mut self) -> Value {
        Value::new(Data::String("@@iterator".to_string()))
    }

    fn call(&mut self, callee: Value, this: Value, arguments: Vec<Value>) -> Value {
        let function = match &*callee.0.borrow() {
            Data::Function(function) => function.clone(),
            _ => return self.type_error("variable is not a function"),
        };
        let program = self.program.clone();
        let saved_scope = std::mem::replace(&mut self.current, ScopeNode::child(&function.home));
        let saved_depth = self.depth;
        self.depth += 1;
        for (name, cell) in function.closure.borrow().iter() {
            self.current.bindings.borrow_mut().insert(
                name.clone(),
                Binding {
                    cell: cell.clone(),
                    mutable: true,
                },
            );
        }
        let mut context = EvalContext::at_entry(function.entry, arguments);
        context.this_value = Some(this);
        let result = VirtualMachine::new().eval(self, &program, &mut context);
        self.current = saved_scope;
        self.depth = saved_depth;
        result
    }

    fn construct(&mut self, callee: Value, arguments: Vec<Value>) -> Value {
        let instance = self.object();
        let result = self.call(callee, instance.clone(), arguments);
        if self.is_exception(&result) {
            return result;
        }
        instance
    }

    fn function_name(&self, callee: &Value) -> Option<String> {
        match &*callee.0.borrow() {
            Data::Function(function) => {
                let name = function.name.borrow().clone();
                if name.is_empty() {
                    None
                } else {
                    Some(name)
                }
            }
            _ => None,
        }
    }

    fn set_function_name(&mut self, callee: &Value, name: &str) {
        if let Data::Function(function) = &*callee.0.borrow() {
            *function.name.borrow_mut() = name.to_string();
        }
    }

    fn bind_closure(&mut self, callee: &Value, name: &str) -> Value {
        let cell = self.lookup(name);
        if self.is_exception(&cell) {
            return cell;
        }
        if let Data::Function(function) = &*callee.0.borrow() {
            function.closure.borrow_mut().insert(name.to_string(), cell);
        }
        Value::new(Data::Undefined)
    }

    fn push_call_frame(&mut self, frame: StackFrame) {
        self.call_stack.push(frame);
    }

    fn pop_call_frame(&mut self) {
        self.call_stack.pop();
    }

    fn to_boolean(&mut self, value: &Value) -> Value {
        Value::new(Data::Boolean(self.truthy(value)))
    }

    fn type_name(&mut self, value: &Value) -> String {
        match &*value.0.borrow() {
            Data::Undefined | Data::Uninitialized => "undefined",
            Data::Null | Data::Object(_) => "object",
            Data::Boolean(_) => "boolean",
            Data::Number(_) => "number",
            Data::String(_) => "string",
            Data::BigInt(_) => "bigint",
            Data::Function(_) => "function",
            Data::Exception(_) | Data::Interrupt(_) => "object",
        }
        .to_string()
    }

    fn copy(&mut self, value: &Value) -> Value {
        Value::new(value.0.borrow().clone())
    }

    fn add(&mut self, left: Value, right: Value) -> Value {
        let result = match (&*left.0.borrow(), &*right.0.borrow()) {
            (Data::Number(left), Data::Number(right)) => Data::Number(left + right),
            (Data::String(left), Data::String(right)) => {
                Data::String(format!("{}{}", left, right))
            }
            (Data::String(left), Data::Number(right)) => {
                Data::String(format!("{}{}", left, right))
            }
            (Data::Number(left), Data::String(right)) => {
                Data::String(format!("{}{}", left, right))
            }
            (Data::BigInt(left), Data::BigInt(right)) => Data::BigInt(left + right),
            _ => return self.type_error("cannot add these operands"),
        };
        Value::new(result)
    }

    fn sub(&mut self, left: Value, right: Value) -> Value {
        self.numeric_binary(left, right, |left, right| left - right)
    }

    fn mul(&mut self, left: Value, right: Value) -> Value {
        self.numeric_binary(left, right, |left, right| left * right)
    }

    fn div(&mut self, left: Value, right: Value) -> Value {
        self.numeric_binary(left, right, |left, right| left / right)
    }

    fn rem(&mut self, left: Value, right: Value) -> Value {
        self.numeric_binary(left, right, |left, right| left % right)
    }

    fn pow(&mut self, left: Value, right: Value) -> Value {
        self.numeric_binary(left, right, f64::powf)
    }

    fn bit_and(&mut self, left: Value, right: Value) -> Value {
        self.integer_binary(left, right, |left, right| left & right)
    }

    fn bit_or(&mut self, left: Value, right: Value) -> Value {
        self.integer_binary(left, right, |left, right| left | right)
    }

    fn bit_xor(&mut self, left: Value, right: Value) -> Value {
        self.integer_binary(left, right, |left, right| left ^ right)
    }

    fn bit_not(&mut self, value: Value) -> Value {
        match self.numeric(&value) {
            Some(value) => Value::new(Data::Number(!(value as i64) as f64)),
            None => self.type_error("operand is not a number"),
        }
    }

    fn shl(&mut self, left: Value, right: Value) -> Value {
        self.integer_binary(left, right, |left, right| left << (right & 0x1f))
    }

    fn shr(&mut self, left: Value, right: Value) -> Value {
        self.integer_binary(left, right, |left, right| left >> (right & 0x1f))
    }

    fn equal(&mut self, left: Value, right: Value) -> Value {
        let result = match (&*left.0.borrow(), &*right.0.borrow()) {
            (Data::Number(left), Data::Number(right)) => left == right,
            (Data::String(left), Data::String(right)) => left == right,
            (Data::Boolean(left), Data::Boolean(right)) => left == right,
            (Data::BigInt(left), Data::BigInt(right)) => left == right,
            (Data::Undefined, Data::Undefined) => true,
            (Data::Null, Data::Null) => true,
            (Data::Undefined, Data::Null) | (Data::Null, Data::Undefined) => true,
            (Data::Object(left), Data::Object(right)) => Rc::ptr_eq(left, right),
            (Data::Function(left), Data::Function(right)) => Rc::ptr_eq(left, right),
            _ => false,
        };
        Value::new(Data::Boolean(result))
    }

    fn less(&mut self, left: Value, right: Value) -> Value {
        self.compare(left, right, |left, right| left < right)
    }

    fn greater(&mut self, left: Value, right: Value) -> Value {
        self.compare(left, right, |left, right| left > right)
    }

    fn less_equal(&mut self, left: Value, right: Value) -> Value {
        self.compare(left, right, |left, right| left <= right)
    }

    fn greater_equal(&mut self, left: Value, right: Value) -> Value {
        self.compare(left, right, |left, right| left >= right)
    }

    fn unary_plus(&mut self, value: Value) -> Value {
        match self.numeric(&value) {
            Some(value) => Value::new(Data::Number(value)),
            None => Value::new(Data::Number(f64::NAN)),
        }
    }

    fn unary_neg(&mut self, value: Value) -> Value {
        match self.numeric(&value) {
            Some(value) => Value::new(Data::Number(-value)),
            None => Value::new(Data::Number(f64::NAN)),
        }
    }

    fn inc(&mut self, value: Value) -> Value {
        let number = match self.numeric(&value) {
            Some(number) => number,
            None => return self.type_error("operand is not a number"),
        };
        *value.0.borrow_mut() = Data::Number(number + 1.0);
        value
    }

    fn dec(&mut self, value: Value) -> Value {
        let number = match self.numeric(&value) {
            Some(number) => number,
            None => return self.type_error("operand is not a number"),
        };
        *value.0.borrow_mut() = Data::Number(number - 1.0);
        value
    }
}
