use std::fmt;
use std::ops::BitOr;

use mlua::{Function, Table, Value};

use crate::error::{BindError, Result};

/// Argument contract of a script-callable entry, checked before the handler runs.
///
/// Specs compose with `|`, so `ArgSpec::req(1) | ArgSpec::opt(1)` accepts one
/// or two arguments and `ArgSpec::req(1) | ArgSpec::block()` wants one
/// argument followed by a function.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArgSpec {
    required: usize,
    optional: usize,
    rest: bool,
    block: bool,
}

impl ArgSpec {
    pub const fn none() -> Self {
        Self {
            required: 0,
            optional: 0,
            rest: false,
            block: false,
        }
    }

    pub const fn req(n: usize) -> Self {
        Self {
            required: n,
            ..Self::none()
        }
    }

    pub const fn opt(n: usize) -> Self {
        Self {
            optional: n,
            ..Self::none()
        }
    }

    pub const fn any() -> Self {
        Self {
            rest: true,
            ..Self::none()
        }
    }

    pub const fn block() -> Self {
        Self {
            block: true,
            ..Self::none()
        }
    }

    pub fn takes_block(&self) -> bool {
        self.block
    }

    /// Validate a call to `name`; the trailing block, when required, is not counted.
    pub fn check(&self, name: &str, args: &[Value]) -> Result<()> {
        let positional = if self.block {
            match args.last() {
                Some(Value::Function(_)) => args.len() - 1,
                _ => {
                    return Err(BindError::Arity {
                        name: name.to_string(),
                        given: args.len(),
                        expected: self.to_string(),
                    });
                }
            }
        } else {
            args.len()
        };

        let too_few = positional < self.required;
        let too_many = !self.rest && positional > self.required + self.optional;
        if too_few || too_many {
            return Err(BindError::Arity {
                name: name.to_string(),
                given: positional,
                expected: self.to_string(),
            });
        }
        Ok(())
    }
}

impl BitOr for ArgSpec {
    type Output = ArgSpec;

    fn bitor(self, rhs: ArgSpec) -> ArgSpec {
        ArgSpec {
            required: self.required + rhs.required,
            optional: self.optional + rhs.optional,
            rest: self.rest || rhs.rest,
            block: self.block || rhs.block,
        }
    }
}

impl fmt::Display for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rest {
            write!(f, "{}+", self.required)?;
        } else if self.optional == 0 {
            write!(f, "{}", self.required)?;
        } else {
            write!(f, "{}..{}", self.required, self.required + self.optional)?;
        }
        if self.block {
            write!(f, " and a block")?;
        }
        Ok(())
    }
}

/// Positional arguments of one call, receiver already removed.
#[derive(Debug, Clone, Default)]
pub struct Args {
    name: String,
    values: Vec<Value>,
}

impl Args {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Qualified name of the callee, used in error messages.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, i: usize) -> &Value {
        self.values.get(i).unwrap_or(&Value::Nil)
    }

    pub fn string(&self, i: usize) -> Result<String> {
        match self.get(i) {
            Value::String(s) => Ok(s.to_string_lossy().to_string()),
            other => Err(self.mismatch(i, "a string", other)),
        }
    }

    /// A string argument that may be omitted or nil.
    pub fn opt_string(&self, i: usize) -> Result<Option<String>> {
        match self.get(i) {
            Value::Nil => Ok(None),
            Value::String(s) => Ok(Some(s.to_string_lossy().to_string())),
            other => Err(self.mismatch(i, "a string or nil", other)),
        }
    }

    pub fn integer(&self, i: usize) -> Result<i64> {
        match self.get(i) {
            Value::Integer(n) => Ok(*n),
            other => Err(self.mismatch(i, "an integer", other)),
        }
    }

    pub fn table(&self, i: usize) -> Result<Table> {
        match self.get(i) {
            Value::Table(t) => Ok(t.clone()),
            other => Err(self.mismatch(i, "a table", other)),
        }
    }

    /// The trailing block of a block-accepting call.
    pub fn block(&self) -> Result<Function> {
        match self.values.last() {
            Some(Value::Function(f)) => Ok(f.clone()),
            _ => Err(BindError::type_error(format!("{} expects a block", self.name))),
        }
    }

    fn mismatch(&self, i: usize, expected: &str, got: &Value) -> BindError {
        BindError::type_error(format!(
            "{}: argument {} must be {}, got {}",
            self.name,
            i + 1,
            expected,
            got.type_name()
        ))
    }
}
