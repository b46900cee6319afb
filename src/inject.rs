//! Dependency-injection boundary.
//!
//! The dispatch core needs exactly one capability from whatever container the
//! application uses: resolve a declared type to a live instance. Handler
//! identity is captured at registration time as a [`BoundMethod`] — an
//! explicit (declaring type, method name) pair plus a monomorphized invoke
//! thunk — so no runtime introspection is involved and the invocation target
//! of a route is immutable once bound.

use crate::context::RequestContext;
use anyhow::{anyhow, Result};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// The single contract the core requires from a DI container.
///
/// Whether `resolve` constructs a fresh object or reuses a singleton is the
/// container's business; the core only needs the call to succeed or fail.
pub trait InstanceResolver: Send + Sync {
    fn resolve(&self, type_id: TypeId) -> Option<Arc<dyn Any + Send + Sync>>;
}

/// A handler method bound to its declaring type.
///
/// Built once when the route is registered; carries everything invocation
/// needs later: the `TypeId` to resolve through the container, the names for
/// logging, and a thunk that downcasts the resolved instance and calls the
/// method with the request context.
#[derive(Clone)]
pub struct BoundMethod {
    type_id: TypeId,
    type_name: &'static str,
    method_name: &'static str,
    invoke: Arc<dyn Fn(&(dyn Any + Send + Sync), &mut RequestContext) -> Result<()> + Send + Sync>,
}

impl BoundMethod {
    /// Bind `method` of declaring type `T` under the given name.
    pub fn bind<T, F>(method_name: &'static str, method: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T, &mut RequestContext) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            method_name,
            invoke: Arc::new(move |instance, ctx| {
                let target = instance.downcast_ref::<T>().ok_or_else(|| {
                    anyhow!(
                        "resolved instance is not a {} (invoking {})",
                        std::any::type_name::<T>(),
                        method_name
                    )
                })?;
                method(target, ctx)
            }),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn method_name(&self) -> &'static str {
        self.method_name
    }

    pub fn invoke(
        &self,
        instance: &(dyn Any + Send + Sync),
        ctx: &mut RequestContext,
    ) -> Result<()> {
        (self.invoke)(instance, ctx)
    }
}

impl std::fmt::Debug for BoundMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}", self.type_name, self.method_name)
    }
}

/// Minimal resolver for applications without a container: a map of
/// pre-constructed singletons keyed by type.
#[derive(Default)]
pub struct SingletonResolver {
    instances: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl SingletonResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an instance; one per type, last registration wins.
    pub fn register<T: Any + Send + Sync>(&mut self, instance: T) -> &mut Self {
        self.instances.insert(TypeId::of::<T>(), Arc::new(instance));
        self
    }
}

impl InstanceResolver for SingletonResolver {
    fn resolve(&self, type_id: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
        self.instances.get(&type_id).cloned()
    }
}
