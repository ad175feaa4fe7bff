use anyhow::Result;
use std::collections::HashMap;

use crate::include::SourceStore;

pub const DEFAULT_MAX_HOOKS: usize = 64;

pub trait Autoloader {
    fn name(&self) -> &str;

    /// `Ok(false)` hands the class to the next hook in the chain.
    fn load(&self, class: &str, sources: &mut SourceStore) -> Result<bool>;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("autoloader `{hook}` is already registered")]
    Duplicate { hook: String },
    #[error("cannot register autoloader `{hook}`: hook list is full ({max} hooks)")]
    Exhausted { hook: String, max: usize },
}

impl RegistrationError {
    pub fn hook(&self) -> &str {
        match self {
            Self::Duplicate { hook } | Self::Exhausted { hook, .. } => hook,
        }
    }
}

pub struct AutoloadRegistry {
    hooks: Vec<Box<dyn Autoloader>>,
    loaded: HashMap<String, String>,
    max_hooks: usize,
}

impl Default for AutoloadRegistry {
    fn default() -> Self {
        Self::with_capacity_limit(DEFAULT_MAX_HOOKS)
    }
}

impl std::fmt::Debug for AutoloadRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoloadRegistry")
            .field("hooks", &self.hook_names())
            .field("loaded", &self.loaded.len())
            .field("max_hooks", &self.max_hooks)
            .finish()
    }
}

impl AutoloadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_limit(max_hooks: usize) -> Self {
        Self {
            hooks: Vec::new(),
            loaded: HashMap::new(),
            max_hooks,
        }
    }

    pub fn register(
        &mut self,
        hook: Box<dyn Autoloader>,
        prepend: bool,
    ) -> std::result::Result<(), RegistrationError> {
        let name = hook.name().to_string();
        if self.hooks.iter().any(|h| h.name() == name) {
            return Err(RegistrationError::Duplicate { hook: name });
        }
        if self.hooks.len() >= self.max_hooks {
            return Err(RegistrationError::Exhausted {
                hook: name,
                max: self.max_hooks,
            });
        }

        log::info!(
            "registered autoloader `{name}` ({})",
            if prepend { "prepend" } else { "append" }
        );
        if prepend {
            self.hooks.insert(0, hook);
        } else {
            self.hooks.push(hook);
        }
        Ok(())
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.hooks.len();
        self.hooks.retain(|h| h.name() != name);
        self.hooks.len() != before
    }

    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    pub fn is_loaded(&self, class: &str) -> bool {
        self.loaded.contains_key(class)
    }

    pub fn autoload(&mut self, class: &str, sources: &mut SourceStore) -> Result<Option<String>> {
        if let Some(name) = self.loaded.get(class) {
            return Ok(Some(name.clone()));
        }

        for hook in &self.hooks {
            if hook.load(class, sources)? {
                log::debug!("`{}` loaded {class}", hook.name());
                let name = hook.name().to_string();
                self.loaded.insert(class.to_string(), name.clone());
                return Ok(Some(name));
            }
        }

        log::debug!("no autoloader could load {class}");
        Ok(None)
    }
}
