use prost_reflect::{DescriptorPool, MethodDescriptor};
use prost_types::FileDescriptorSet;
use std::sync::Arc;

/// Errors that can occur when looking up a symbol in the [`Registry`].
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("Service '{0}' not found")]
    ServiceNotFound(String),
    #[error("Method '{0}' not found")]
    MethodNotFound(String),
    #[error("Invalid method name '{0}', expected 'package.Service.Method'")]
    InvalidMethodName(String),
}

/// An immutable index over every file descriptor produced by one schema load.
///
/// Cloning is cheap: the descriptor pool and the flattened set are shared.
#[derive(Debug, Clone)]
pub struct Registry {
    pool: DescriptorPool,
    fd_set: Arc<FileDescriptorSet>,
}

impl Registry {
    pub(crate) fn new(pool: DescriptorPool, fd_set: FileDescriptorSet) -> Self {
        Self {
            pool,
            fd_set: Arc::new(fd_set),
        }
    }

    /// Builds a registry from an already compiled descriptor set.
    pub fn from_file_descriptor_set(
        fd_set: FileDescriptorSet,
    ) -> Result<Self, prost_reflect::DescriptorError> {
        let pool = DescriptorPool::from_file_descriptor_set(fd_set.clone())?;
        Ok(Self::new(pool, fd_set))
    }

    pub fn descriptor_pool(&self) -> &DescriptorPool {
        &self.pool
    }

    /// The flattened set this registry was built from, dependencies first.
    pub fn file_descriptor_set(&self) -> &FileDescriptorSet {
        &self.fd_set
    }

    pub fn file_names(&self) -> Vec<&str> {
        self.fd_set.file.iter().map(|f| f.name()).collect()
    }

    /// Lists all services, fully qualified (e.g. `helloworld.Greeter`), sorted.
    pub fn services(&self) -> Vec<String> {
        let mut services: Vec<String> = self
            .pool
            .services()
            .map(|s| s.full_name().to_string())
            .collect();

        services.sort();
        services
    }

    /// Lists the short names of the methods of `service`, sorted.
    ///
    /// Returns an empty list if the service does not exist.
    pub fn methods(&self, service: &str) -> Vec<String> {
        let mut methods: Vec<String> = self
            .pool
            .get_service_by_name(service)
            .map(|s| s.methods().map(|m| m.name().to_string()).collect())
            .unwrap_or_default();

        methods.sort();
        methods
    }

    /// Finds a method by its fully qualified name (e.g. `helloworld.Greeter.SayHello`).
    pub fn resolve_method(&self, method_full_name: &str) -> Result<MethodDescriptor, LookupError> {
        if !method_full_name.contains('.') {
            return Err(LookupError::InvalidMethodName(method_full_name.to_string()));
        }

        self.pool
            .services()
            .flat_map(|s| s.methods().collect::<Vec<_>>())
            .find(|m| m.full_name() == method_full_name)
            .ok_or_else(|| LookupError::MethodNotFound(method_full_name.to_string()))
    }

    /// Finds `method` inside `service`, distinguishing an unknown service from an unknown method.
    pub fn resolve_service_method(
        &self,
        service: &str,
        method: &str,
    ) -> Result<MethodDescriptor, LookupError> {
        self.pool
            .get_service_by_name(service)
            .ok_or_else(|| LookupError::ServiceNotFound(service.to_string()))?
            .methods()
            .find(|m| m.name() == method)
            .ok_or_else(|| LookupError::MethodNotFound(format!("{service}.{method}")))
    }
}
