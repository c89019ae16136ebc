//! Order form state: draft, submission and the local status update that
//! follows a successful order.

use chrono::{DateTime, Utc};

use crate::error::ApiError;
use crate::map_state::PlotStore;
use crate::models::{IntendedUse, OrderData, OrderValidationError, Plot, PlotOrder};

/// Raw form input, kept as typed so a failed submit loses nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderDraft {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub customer_id_number: String,
    pub intended_use: IntendedUse,
    pub notes: String,
}

impl OrderDraft {
    pub fn validate(&self) -> Result<OrderData, OrderValidationError> {
        OrderData {
            customer_name: self.customer_name.clone(),
            customer_phone: self.customer_phone.clone(),
            customer_email: Some(self.customer_email.clone()),
            customer_id_number: self.customer_id_number.clone(),
            intended_use: self.intended_use,
            notes: Some(self.notes.clone()),
        }
        .validated()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum FormPhase {
    #[default]
    Editing,
    Submitting,
    Failed(String),
}

/// An open order form for one plot.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderFlow {
    pub plot: Plot,
    pub draft: OrderDraft,
    pub phase: FormPhase,
}

impl OrderFlow {
    /// Open the form. Only available plots can be ordered.
    pub fn open(plot: &Plot) -> Option<OrderFlow> {
        plot.is_available().then(|| OrderFlow {
            plot: plot.clone(),
            draft: OrderDraft::default(),
            phase: FormPhase::Editing,
        })
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == FormPhase::Submitting
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            FormPhase::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Validate the draft and move to `Submitting`. Returns the payload to
    /// send, or `None` if a submit is already running or the draft is
    /// invalid (the reason is then shown on the form).
    pub fn begin_submit(&mut self) -> Option<OrderData> {
        if self.is_submitting() {
            return None;
        }
        match self.draft.validate() {
            Ok(data) => {
                self.phase = FormPhase::Submitting;
                Some(data)
            }
            Err(err) => {
                self.phase = FormPhase::Failed(err.to_string());
                None
            }
        }
    }

    pub fn finish_submit(
        self,
        result: Result<PlotOrder, ApiError>,
        store: &mut PlotStore,
        now: DateTime<Utc>,
    ) -> Option<OrderFlow> {
        let plot_id = self.plot.id.clone();
        settle_order(Some(self), &plot_id, result, store, now)
    }
}

/// Apply the outcome of an order for `plot_id`.
///
/// On success the plot turns `pending` locally and a form open for that plot
/// closes. On failure that form stays open showing the message. A form open
/// for a different plot is left untouched either way.
pub fn settle_order(
    open: Option<OrderFlow>,
    plot_id: &str,
    result: Result<PlotOrder, ApiError>,
    store: &mut PlotStore,
    now: DateTime<Utc>,
) -> Option<OrderFlow> {
    let same_plot = open.as_ref().is_some_and(|f| f.plot.id == plot_id);
    match result {
        Ok(order) => {
            tracing::info!(plot_id, order_id = %order.id, "order submitted");
            if !store.mark_pending(plot_id, now) {
                tracing::warn!(plot_id, "ordered plot is no longer loaded");
            }
            if same_plot {
                None
            } else {
                open
            }
        }
        Err(err) => {
            tracing::warn!(plot_id, error = %err, "order submission failed");
            match open {
                Some(mut flow) if same_plot => {
                    flow.phase = FormPhase::Failed(err.user_message());
                    Some(flow)
                }
                other => other,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{PlotLoad, PlotSource};
    use crate::map_state::resolve_click;
    use crate::models::{OrderStatus, PlotStatus};
    use crate::sample::sample_plots;

    fn store() -> PlotStore {
        let mut store = PlotStore::default();
        let ticket = store.begin_load();
        store.finish_load(
            ticket,
            Ok(PlotLoad {
                plots: sample_plots(),
                rejected: 0,
                source: PlotSource::Sample,
            }),
        );
        store
    }

    fn filled(flow: &mut OrderFlow) {
        flow.draft = OrderDraft {
            customer_name: "Amina Juma".into(),
            customer_phone: "0712 345 678".into(),
            customer_email: String::new(),
            customer_id_number: "19900101-12345".into(),
            intended_use: IntendedUse::Agricultural,
            notes: "Maize".into(),
        };
    }

    fn order_for(plot_id: &str) -> PlotOrder {
        let now = Utc::now();
        PlotOrder {
            id: "ord-1".into(),
            plot_id: plot_id.into(),
            plot_code: None,
            customer_name: "Amina Juma".into(),
            customer_phone: "0712345678".into(),
            customer_email: None,
            customer_id_number: "19900101-12345".into(),
            intended_use: IntendedUse::Agricultural,
            notes: Some("Maize".into()),
            status: OrderStatus::Pending,
            admin_notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_successful_order_marks_plot_pending_and_closes_form() {
        let mut store = store();
        let mut flow = OrderFlow::open(store.get("1").unwrap()).unwrap();
        filled(&mut flow);
        let payload = flow.begin_submit().unwrap();
        assert_eq!(payload.customer_phone, "0712345678");
        assert!(payload.customer_email.is_none());
        assert!(flow.is_submitting());

        let next = flow.finish_submit(Ok(order_for("1")), &mut store, Utc::now());
        assert!(next.is_none());
        assert_eq!(store.get("1").unwrap().status, PlotStatus::Pending);
        assert!(resolve_click(store.plots(), "1").is_none());
    }

    #[test]
    fn test_conflict_keeps_form_open_with_message() {
        let mut store = store();
        let mut flow = OrderFlow::open(store.get("1").unwrap()).unwrap();
        filled(&mut flow);
        flow.begin_submit().unwrap();
        let err = ApiError::from_status(409, r#"{"detail":"Plot already taken"}"#);
        let next = flow.finish_submit(Err(err), &mut store, Utc::now()).unwrap();
        assert_eq!(next.error(), Some("Plot already taken"));
        assert_eq!(next.draft.customer_name, "Amina Juma");
        assert_eq!(store.get("1").unwrap().status, PlotStatus::Available);
    }

    #[test]
    fn test_pending_plot_cannot_open_form() {
        let store = store();
        assert!(OrderFlow::open(store.get("4").unwrap()).is_none());
        assert!(OrderFlow::open(store.get("2").unwrap()).is_none());
    }

    #[test]
    fn test_invalid_draft_is_not_submitted() {
        let store = store();
        let mut flow = OrderFlow::open(store.get("3").unwrap()).unwrap();
        filled(&mut flow);
        flow.draft.customer_phone = "+44 20 7946 0958".into();
        assert!(flow.begin_submit().is_none());
        assert_eq!(flow.error(), Some("Phone number must be a valid Tanzania number"));
        // Fixing the field allows a retry
        flow.draft.customer_phone = "+255712345678".into();
        assert!(flow.begin_submit().is_some());
    }

    #[test]
    fn test_double_submit_is_ignored() {
        let store = store();
        let mut flow = OrderFlow::open(store.get("5").unwrap()).unwrap();
        filled(&mut flow);
        assert!(flow.begin_submit().is_some());
        assert!(flow.begin_submit().is_none());
        assert!(flow.is_submitting());
    }

    #[test]
    fn test_result_for_other_plot_leaves_open_form_alone() {
        let mut store = store();
        let flow = OrderFlow::open(store.get("3").unwrap()).unwrap();
        let next = settle_order(Some(flow.clone()), "1", Ok(order_for("1")), &mut store, Utc::now());
        assert_eq!(next, Some(flow));
        assert_eq!(store.get("1").unwrap().status, PlotStatus::Pending);
    }

    #[test]
    fn test_success_after_form_closed_still_updates_store() {
        let mut store = store();
        let next = settle_order(None, "5", Ok(order_for("5")), &mut store, Utc::now());
        assert!(next.is_none());
        assert_eq!(store.get("5").unwrap().status, PlotStatus::Pending);
    }
}
