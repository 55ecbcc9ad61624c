use std::sync::Arc;

use cronbind_core::Properties;
use cronbind_engine::FireContext;

use crate::error::{Result, SchedulerError};
use crate::method::{ArgValue, MethodRef, ParamSpec};

/// A validated argument plan for one method.
///
/// Planning happens once, when the job is built; materializing happens on
/// every fire. Keeping the two apart means an unsatisfiable parameter list
/// fails the declaration up front instead of failing every fire.
#[derive(Debug, Clone)]
pub struct ArgPlan {
    slots: Vec<Slot>,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Fire,
    Props,
}

/// Validate a method's declared parameters against the supported
/// capabilities.
pub fn plan(method: &MethodRef) -> Result<ArgPlan> {
    let mut slots = Vec::with_capacity(method.params().len());
    for param in method.params() {
        match param {
            ParamSpec::FireContext => slots.push(Slot::Fire),
            ParamSpec::Properties => slots.push(Slot::Props),
            ParamSpec::Opaque(name) => {
                return Err(SchedulerError::UnsupportedParameter {
                    method: method.name().to_string(),
                    param: name.clone(),
                });
            }
        }
    }
    Ok(ArgPlan { slots })
}

impl ArgPlan {
    /// Produce the argument list for one fire, in declaration order.
    pub fn materialize(&self, ctx: &FireContext, props: &Arc<Properties>) -> Vec<ArgValue> {
        self.slots
            .iter()
            .map(|slot| match slot {
                Slot::Fire => ArgValue::Fire(ctx.clone()),
                Slot::Props => ArgValue::Props(Arc::clone(props)),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
