use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::component::error::ComponentError;
use crate::kernel::error::Result;
use crate::utils::{read, write};

/// Signature of an injected method.
pub type AttachedFn = dyn Fn(Value) -> Result<Value> + Send + Sync;

/// A function injected into a component under a method name.
///
/// Cloning shares the underlying function; [`same_as`](Self::same_as) tells
/// whether two handles refer to the same injected function.
#[derive(Clone)]
pub struct Attachment {
    func: Arc<AttachedFn>,
}

impl Attachment {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self { func: Arc::new(func) }
    }

    pub fn call(&self, args: Value) -> Result<Value> {
        (self.func)(args)
    }

    pub fn same_as(&self, other: &Attachment) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachment").finish_non_exhaustive()
    }
}

/// Capability to receive injected methods.
pub trait Attachable {
    /// Register `attachment` under `method`, replacing any previous one.
    fn attach(&self, method: &str, attachment: Attachment);
}

/// Per-component method table, shared between the registry record and every
/// [`ComponentContext`](crate::component::ComponentContext) handed out for it,
/// so attachments made after startup are visible to running code.
#[derive(Clone)]
pub struct Attachments {
    owner: Arc<str>,
    methods: Arc<RwLock<HashMap<String, Attachment>>>,
}

impl Attachments {
    pub fn new(owner: &str) -> Self {
        Self {
            owner: Arc::from(owner),
            methods: Arc::default(),
        }
    }

    pub fn insert(&self, method: &str, attachment: Attachment) {
        if write(&self.methods)
            .insert(method.to_string(), attachment)
            .is_some()
        {
            log::debug!("Replaced attached method '{}' on '{}'", method, self.owner);
        }
    }

    pub fn get(&self, method: &str) -> Option<Attachment> {
        read(&self.methods).get(method).cloned()
    }

    pub fn contains(&self, method: &str) -> bool {
        read(&self.methods).contains_key(method)
    }

    /// Attached method names, sorted.
    pub fn methods(&self) -> Vec<String> {
        let mut names: Vec<String> = read(&self.methods).keys().cloned().collect();
        names.sort();
        names
    }

    /// Invoke an attached method as if it were native to the owner.
    pub fn call(&self, method: &str, args: Value) -> Result<Value> {
        // Clone out of the table so the function runs without the lock held.
        let attachment = self.get(method).ok_or_else(|| ComponentError::AttachmentNotFound {
            component: self.owner.to_string(),
            method: method.to_string(),
        })?;
        attachment.call(args)
    }
}

impl Attachable for Attachments {
    fn attach(&self, method: &str, attachment: Attachment) {
        self.insert(method, attachment);
    }
}

impl fmt::Debug for Attachments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attachments")
            .field("owner", &self.owner)
            .field("methods", &self.methods())
            .finish()
    }
}

/// One or more target component names for an attach request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachTargets(Vec<String>);

impl AttachTargets {
    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl From<&str> for AttachTargets {
    fn from(name: &str) -> Self {
        AttachTargets(vec![name.to_string()])
    }
}

impl From<String> for AttachTargets {
    fn from(name: String) -> Self {
        AttachTargets(vec![name])
    }
}

impl From<Vec<String>> for AttachTargets {
    fn from(names: Vec<String>) -> Self {
        AttachTargets(names)
    }
}

impl From<Vec<&str>> for AttachTargets {
    fn from(names: Vec<&str>) -> Self {
        AttachTargets(names.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for AttachTargets {
    fn from(names: &[&str]) -> Self {
        AttachTargets(names.iter().map(|name| name.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for AttachTargets {
    fn from(names: [&str; N]) -> Self {
        AttachTargets(names.iter().map(|name| name.to_string()).collect())
    }
}
