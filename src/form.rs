//! Form Structure - Named, Nested, Addressable Sub-Views
//!
//! The engine does not build forms; an external builder hands it a finished
//! `FormView` tree plus the `ProcessedFieldMap` produced while walking the
//! source form definition. Field paths are dot-separated
//! (for example `address.city`) and resolve by successive named lookup.

use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::value::FormViewHandle;

/// Field path -> block id expected to render that field.
///
/// Produced once per build pass by the external form-layout builder,
/// immutable after creation, consumed exactly once by the reconciler.
pub type ProcessedFieldMap = IndexMap<String, String>;

/// A node in an externally supplied form structure.
///
/// Shared as `FormViewHandle` (`Rc<FormView>`); the `rendered` flag is the
/// only state mutated after construction, by the reconciler marking fields
/// the fallback renderer must skip.
#[derive(Debug)]
pub struct FormView {
    name: String,
    children: IndexMap<String, FormViewHandle>,
    prototype: Option<FormViewHandle>,
    multipart: bool,
    rendered: Cell<bool>,
    class_prefix: RefCell<Option<String>>,
}

impl FormView {
    pub fn build(name: impl Into<String>) -> FormViewBuilder {
        FormViewBuilder {
            name: name.into(),
            children: IndexMap::new(),
            prototype: None,
            multipart: false,
        }
    }

    /// A childless field view.
    pub fn leaf(name: impl Into<String>) -> FormViewHandle {
        Self::build(name).finish()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn child(&self, name: &str) -> Option<&FormViewHandle> {
        self.children.get(name)
    }

    pub fn children(&self) -> impl Iterator<Item = &FormViewHandle> + '_ {
        self.children.values()
    }

    /// Collection prototype sub-view, if this view models a collection.
    pub fn prototype(&self) -> Option<&FormViewHandle> {
        self.prototype.as_ref()
    }

    pub fn is_multipart(&self) -> bool {
        self.multipart
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered.get()
    }

    /// Mark this sub-view as already rendered so the fallback pass skips it.
    pub fn set_rendered(&self) {
        self.rendered.set(true);
    }

    pub fn class_prefix(&self) -> Option<String> {
        self.class_prefix.borrow().clone()
    }

    pub fn set_class_prefix(&self, prefix: &str) {
        *self.class_prefix.borrow_mut() = Some(prefix.to_string());
    }
}

pub struct FormViewBuilder {
    name: String,
    children: IndexMap<String, FormViewHandle>,
    prototype: Option<FormViewHandle>,
    multipart: bool,
}

impl FormViewBuilder {
    pub fn child(mut self, view: FormViewHandle) -> Self {
        self.children.insert(view.name().to_string(), view);
        self
    }

    pub fn prototype(mut self, view: FormViewHandle) -> Self {
        self.prototype = Some(view);
        self
    }

    pub fn multipart(mut self, multipart: bool) -> Self {
        self.multipart = multipart;
        self
    }

    pub fn finish(self) -> FormViewHandle {
        Rc::new(FormView {
            name: self.name,
            children: self.children,
            prototype: self.prototype,
            multipart: self.multipart,
            rendered: Cell::new(false),
            class_prefix: RefCell::new(None),
        })
    }
}

/// Resolve a dot-separated field path by successive named-child lookup.
///
/// Returns `None` if any segment is absent; the reconciler treats that as a
/// fatal topology inconsistency.
pub fn find_view<'a>(root: &'a FormViewHandle, path: &str) -> Option<&'a FormViewHandle> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.child(segment)?;
    }
    Some(current)
}

/// HTTP-style submit target of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormAction {
    None,
    Path(String),
    Route { name: String, params: IndexMap<String, String> },
}

impl FormAction {
    pub fn by_path(path: impl Into<String>) -> Self {
        FormAction::Path(path.into())
    }

    pub fn by_route(name: impl Into<String>, params: IndexMap<String, String>) -> Self {
        FormAction::Route {
            name: name.into(),
            params,
        }
    }

    pub fn path(&self) -> Option<&str> {
        match self {
            FormAction::Path(path) => Some(path),
            _ => None,
        }
    }

    pub fn route_name(&self) -> Option<&str> {
        match self {
            FormAction::Route { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Wraps a form view with its submit parameters and the processed-field map
/// accumulated by the external form-layout builder.
pub struct FormAccessor {
    name: String,
    view: FormViewHandle,
    action: FormAction,
    method: Option<String>,
    enctype: Option<String>,
    processed_fields: Option<ProcessedFieldMap>,
}

impl FormAccessor {
    pub fn new(name: impl Into<String>, view: FormViewHandle) -> Self {
        Self {
            name: name.into(),
            view,
            action: FormAction::None,
            method: None,
            enctype: None,
            processed_fields: None,
        }
    }

    pub fn with_action(mut self, action: FormAction) -> Self {
        self.action = action;
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_enctype(mut self, enctype: impl Into<String>) -> Self {
        self.enctype = Some(enctype.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root view, or a nested sub-view addressed by a dot-separated path.
    pub fn view(&self, path: &str) -> Option<&FormViewHandle> {
        if path.is_empty() {
            return Some(&self.view);
        }
        find_view(&self.view, path)
    }

    pub fn root_view(&self) -> &FormViewHandle {
        &self.view
    }

    pub fn action(&self) -> &FormAction {
        &self.action
    }

    /// Submit method, normalized to uppercase. Defaults to `POST`.
    pub fn method(&self) -> String {
        self.method
            .as_deref()
            .unwrap_or("post")
            .to_ascii_uppercase()
    }

    /// Encoding type. Falls back to `multipart/form-data` for multipart views.
    pub fn enctype(&self) -> Option<String> {
        if let Some(enctype) = &self.enctype {
            return Some(enctype.clone());
        }
        if self.view.is_multipart() {
            return Some("multipart/form-data".to_string());
        }
        None
    }

    pub fn set_processed_fields(&mut self, fields: ProcessedFieldMap) {
        self.processed_fields = Some(fields);
    }

    pub fn processed_fields(&self) -> Option<&ProcessedFieldMap> {
        self.processed_fields.as_ref()
    }
}

impl fmt::Display for FormAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        match &self.action {
            FormAction::None => {}
            FormAction::Path(path) => write!(f, ";action_path:{path}")?,
            FormAction::Route { name, .. } => write!(f, ";action_route:{name}")?,
        }
        if let Some(method) = &self.method {
            write!(f, ";method:{method}")?;
        }
        if let Some(enctype) = &self.enctype {
            write!(f, ";enctype:{enctype}")?;
        }
        Ok(())
    }
}
