//! Host activation wiring
//!
//! Builds a broker instance and registers the update command with the
//! hosting editor, so producer extensions can push state by command id
//! without holding a reference to the facade object.

use std::rc::Rc;

use serde_json::Value;

use devctx_broker::{CommandHost, ContextOptions, DevContext, Subscription};

/// Stable command id producers invoke to push a state update.
pub const UPDATE_COMMAND_ID: &str = "devctx.updateState";

/// A live broker plus the command registration keeping it reachable.
pub struct ActivatedContext {
    context: Rc<DevContext>,
    command: Subscription,
}

impl ActivatedContext {
    /// The broker facade.
    pub fn context(&self) -> &Rc<DevContext> {
        &self.context
    }

    /// Unregister the command and dispose the broker. Idempotent, like
    /// [`DevContext::dispose`].
    pub fn dispose(&mut self) {
        self.command.dispose();
        self.context.dispose();
    }
}

impl Drop for ActivatedContext {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Create a broker and register [`UPDATE_COMMAND_ID`] with the host.
///
/// The registered handler feeds the payload straight into
/// [`DevContext::update`], so command-pushed updates go through exactly
/// the same validation and fan-out as direct calls.
pub fn activate(host: &dyn CommandHost, options: ContextOptions) -> ActivatedContext {
    let context = Rc::new(DevContext::new(options));
    let handler = {
        let context = Rc::clone(&context);
        Box::new(move |payload: &Value| context.update(payload))
    };
    let command = host.register_command(UPDATE_COMMAND_ID, handler);
    tracing::debug!(command = UPDATE_COMMAND_ID, "broker activated");
    ActivatedContext { context, command }
}
