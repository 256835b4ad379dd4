//! Host-owned state for script objects.
//!
//! Lua values carry no slot for opaque host data, so each class keeps an
//! append-only list pairing the script-visible table with its vars bag and
//! finds the bag again by identity. Lookups are linear; a session creates a
//! handful of objects per class.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use mlua::{Lua, Table, Value};
use once_cell::unsync::OnceCell;

use crate::arity::ArgSpec;
use crate::class::{ClassDefinition, InstalledClass};
use crate::error::{BindError, Result};

/// One script object and the state the host keeps for it.
#[derive(Debug)]
pub struct InstanceRecord<V> {
    pub this: Table,
    pub vars: Rc<RefCell<V>>,
}

impl<V> Clone for InstanceRecord<V> {
    fn clone(&self) -> Self {
        Self {
            this: self.this.clone(),
            vars: Rc::clone(&self.vars),
        }
    }
}

#[derive(Debug)]
pub struct Bridge<V> {
    name: &'static str,
    class: OnceCell<InstalledClass>,
    objects: RefCell<Vec<InstanceRecord<V>>>,
}

impl<V: Default + 'static> Bridge<V> {
    pub fn new(name: &'static str) -> Rc<Self> {
        Rc::new(Self {
            name,
            class: OnceCell::new(),
            objects: RefCell::new(Vec::new()),
        })
    }

    pub fn upgrade(weak: &Weak<Self>) -> Result<Rc<Self>> {
        weak.upgrade().ok_or(BindError::ClosedHost)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Attach the installed class whose instances this bridge tracks.
    pub fn bind(&self, class: InstalledClass) -> Result<()> {
        self.class
            .set(class)
            .map_err(|_| BindError::Configuration(format!("class {} is already defined", self.name)))
    }

    pub fn class(&self) -> Result<&InstalledClass> {
        self.class
            .get()
            .ok_or_else(|| BindError::Configuration(format!("class {} is not defined", self.name)))
    }

    /// Construct a script object with zero-valued vars and start tracking it.
    pub fn create(&self, lua: &Lua) -> Result<InstanceRecord<V>> {
        let this = self.class()?.instantiate(lua)?;
        let record = InstanceRecord {
            this,
            vars: Rc::new(RefCell::new(V::default())),
        };
        self.objects.borrow_mut().push(record.clone());
        Ok(record)
    }

    /// Like [`Bridge::create`] but seeds the vars bag.
    pub fn create_with(&self, lua: &Lua, vars: V) -> Result<Table> {
        let record = self.create(lua)?;
        *record.vars.borrow_mut() = vars;
        Ok(record.this)
    }

    pub fn lookup_vars(&self, this: &Table) -> Result<Rc<RefCell<V>>> {
        self.objects
            .borrow()
            .iter()
            .find(|record| record.this == *this)
            .map(|record| Rc::clone(&record.vars))
            .ok_or_else(|| BindError::NotFound {
                class: self.name.to_string(),
            })
    }

    pub fn contains(&self, this: &Table) -> bool {
        self.objects.borrow().iter().any(|record| record.this == *this)
    }

    pub fn object_count(&self) -> usize {
        self.objects.borrow().len()
    }

    /// Forget every record. Only the host calls this, at teardown.
    pub fn clear(&self) {
        self.objects.borrow_mut().clear();
    }

    /// Add the class-scope `new` and `object_count` methods every class carries.
    pub fn common_methods(self: &Rc<Self>, def: ClassDefinition) -> ClassDefinition {
        let for_new = Rc::downgrade(self);
        let for_count = Rc::downgrade(self);
        def.class_method("new", ArgSpec::none(), move |lua, _class, _args| {
            let record = Bridge::upgrade(&for_new)?.create(lua)?;
            Ok(Value::Table(record.this))
        })
        .class_method("object_count", ArgSpec::none(), move |_lua, _class, _args| {
            let count = Bridge::upgrade(&for_count)?.object_count();
            Ok(Value::Integer(count as i64))
        })
    }
}
