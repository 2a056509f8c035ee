use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::object::Value;

/// A lexical name-to-value frame with an optional parent link.
///
/// Frames are handed out as `Rc<Environment>` because they are shared: by
/// sibling closures defined in the same scope, by the session driver, and
/// by every call frame enclosing them.  A closure holding a frame observes
/// later `set` calls in that frame.
#[derive(Debug)]
pub struct Environment {
    parent: Option<Rc<Environment>>,
    bindings: RefCell<HashMap<String, Value>>,
}

impl Environment {
    pub fn new() -> Rc<Environment> {
        Self::with_parent(None)
    }

    pub fn new_enclosed(parent: Rc<Environment>) -> Rc<Environment> {
        Self::with_parent(Some(parent))
    }

    fn with_parent(parent: Option<Rc<Environment>>) -> Rc<Environment> {
        Rc::new(Environment {
            parent,
            bindings: RefCell::new(HashMap::new()),
        })
    }

    /// Look `name` up in this frame, then outward through the chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        match self.bindings.borrow().get(name) {
            Some(value) => Some(value.clone()),
            None => self.parent.as_ref().and_then(|p| p.get(name)),
        }
    }

    /// Bind `name` in this frame only, rebinding if it already exists.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }
}
