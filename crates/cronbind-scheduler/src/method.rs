use std::sync::Arc;

use cronbind_core::Properties;
use cronbind_engine::FireContext;

/// Declared parameter shape of a scheduled method.
///
/// The fixed set of capabilities the argument resolver can satisfy, plus an
/// escape hatch recording anything it cannot. Declarations with an `Opaque`
/// parameter are rejected when the job is built, never at fire time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamSpec {
    /// Per-fire execution metadata ([`FireContext`]).
    FireContext,
    /// The host's configuration accessor ([`Properties`]).
    Properties,
    /// An unsupported parameter type; carries its name for diagnostics.
    Opaque(String),
}

/// A resolved argument, in declaration order.
#[derive(Debug, Clone)]
pub enum ArgValue {
    Fire(FireContext),
    Props(Arc<Properties>),
}

impl ArgValue {
    pub fn as_fire(&self) -> Option<&FireContext> {
        match self {
            ArgValue::Fire(ctx) => Some(ctx),
            _ => None,
        }
    }

    pub fn as_props(&self) -> Option<&Properties> {
        match self {
            ArgValue::Props(props) => Some(props),
            _ => None,
        }
    }
}

type MethodBody = Box<dyn Fn(&[ArgValue]) -> anyhow::Result<()> + Send + Sync>;

/// A schedulable method: a name, its declared parameter shape, and a body.
///
/// The target object is captured by the closure — the dispatch-friendly
/// stand-in for "instance plus method handle". The declared `params` drive
/// argument resolution; the body receives the resolved values in the same
/// order.
pub struct MethodRef {
    name: String,
    params: Vec<ParamSpec>,
    body: MethodBody,
}

impl MethodRef {
    pub fn new(
        name: impl Into<String>,
        params: Vec<ParamSpec>,
        body: impl Fn(&[ArgValue]) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params,
            body: Box::new(body),
        }
    }

    /// A method taking no arguments.
    pub fn no_args(
        name: impl Into<String>,
        f: impl Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, Vec::new(), move |_| f())
    }

    /// A method taking the per-fire execution context.
    pub fn with_context(
        name: impl Into<String>,
        f: impl Fn(&FireContext) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, vec![ParamSpec::FireContext], move |args| {
            let ctx = args
                .first()
                .and_then(ArgValue::as_fire)
                .ok_or_else(|| anyhow::anyhow!("execution context argument missing"))?;
            f(ctx)
        })
    }

    /// A method taking the configuration accessor.
    pub fn with_properties(
        name: impl Into<String>,
        f: impl Fn(&Properties) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self::new(name, vec![ParamSpec::Properties], move |args| {
            let props = args
                .first()
                .and_then(ArgValue::as_props)
                .ok_or_else(|| anyhow::anyhow!("configuration argument missing"))?;
            f(props)
        })
    }

    /// A method taking both the configuration accessor and the context.
    pub fn with_properties_and_context(
        name: impl Into<String>,
        f: impl Fn(&Properties, &FireContext) -> anyhow::Result<()> + Send + Sync + 'static,
    ) -> Self {
        Self::new(
            name,
            vec![ParamSpec::Properties, ParamSpec::FireContext],
            move |args| {
                let props = args
                    .first()
                    .and_then(ArgValue::as_props)
                    .ok_or_else(|| anyhow::anyhow!("configuration argument missing"))?;
                let ctx = args
                    .get(1)
                    .and_then(ArgValue::as_fire)
                    .ok_or_else(|| anyhow::anyhow!("execution context argument missing"))?;
                f(props, ctx)
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Invoke the method body with already-resolved arguments.
    pub fn invoke(&self, args: &[ArgValue]) -> anyhow::Result<()> {
        (self.body)(args)
    }
}

impl std::fmt::Debug for MethodRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodRef")
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}
