//! The heart button on a recipe card or header.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{mpsc, oneshot};

use crate::error::GatewayError;
use crate::gateway::{MutationGateway, RequestContext};
use crate::optimistic::{Optimistic, Reconciled};
use crate::types::LikeState;

/// Like state of one rendered recipe, updated optimistically.
#[derive(Debug, Clone)]
pub struct LikeToggle {
    recipe_id: String,
    state: Optimistic<bool>,
}

/// A like mutation waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeRequest {
    pub recipe_id: String,
    pub seq: u64,
    pub liked: bool,
}

/// A settled like mutation, routed back to the toggle that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeResponse {
    pub recipe_id: String,
    pub seq: u64,
    pub result: Result<LikeState, GatewayError>,
}

/// Effect of a [`LikeResponse`] on the displayed heart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikeOutcome {
    Confirmed(bool),
    /// The heart reverted; the caller must show `error` (a sign-in prompt for
    /// [`GatewayError::Unauthenticated`]).
    RolledBack { liked: bool, error: GatewayError },
    Stale,
}

impl LikeToggle {
    pub fn new(recipe_id: impl Into<String>, liked: bool) -> Self {
        Self { recipe_id: recipe_id.into(), state: Optimistic::new(liked) }
    }

    pub fn recipe_id(&self) -> &str {
        &self.recipe_id
    }

    /// What the heart shows right now.
    pub fn liked(&self) -> bool {
        *self.state.value()
    }

    pub fn is_pending(&self) -> bool {
        self.state.is_pending()
    }

    /// Flips the heart immediately and returns the mutation to dispatch.
    pub fn toggle(&mut self) -> LikeRequest {
        let dispatch = self.state.apply(|liked| !liked);
        LikeRequest { recipe_id: self.recipe_id.clone(), seq: dispatch.seq, liked: dispatch.value }
    }

    /// Applies a settled response. Responses for other recipes are stale.
    pub fn resolve(&mut self, response: LikeResponse) -> LikeOutcome {
        if response.recipe_id != self.recipe_id {
            return LikeOutcome::Stale;
        }
        let outcome = response.result.map(|s| s.liked);
        match self.state.resolve(response.seq, outcome) {
            Reconciled::Confirmed(liked) => LikeOutcome::Confirmed(liked),
            Reconciled::RolledBack { restored, error } => {
                LikeOutcome::RolledBack { liked: restored, error }
            }
            Reconciled::Stale => LikeOutcome::Stale,
        }
    }

    /// Replaces the baseline after the recipe list is reloaded.
    pub fn refresh(&mut self, liked: bool) {
        self.state.reset(liked);
    }

    /// Drops any pending toggle and turns its in-flight response stale.
    ///
    /// Used when the acting user changes; the next reload supplies the real baseline.
    pub fn invalidate(&mut self) {
        let confirmed = *self.state.confirmed();
        self.state.reset(confirmed);
    }
}

impl LikeRequest {
    /// Performs the gateway call and packages the result for [`LikeToggle::resolve`].
    pub async fn send<G: MutationGateway>(self, gateway: &G, ctx: &RequestContext) -> LikeResponse {
        let result = gateway.set_like(ctx, &self.recipe_id, self.liked).await;
        LikeResponse { recipe_id: self.recipe_id, seq: self.seq, result }
    }
}

type Queued = (LikeRequest, RequestContext, oneshot::Sender<LikeResponse>);

/// Sends like mutations one recipe at a time, in the order they were submitted.
///
/// `set_like` writes absolute state, so two writes for the same recipe must
/// reach the store in dispatch order or the store could keep an older intent
/// than the one the toggle confirms. Each recipe gets a lane: a task draining
/// an unbounded channel. Different recipes still run concurrently.
pub struct LikeLanes<G> {
    gateway: G,
    lanes: Arc<Mutex<HashMap<String, mpsc::UnboundedSender<Queued>>>>,
}

impl<G: Clone> Clone for LikeLanes<G> {
    fn clone(&self) -> Self {
        Self { gateway: self.gateway.clone(), lanes: Arc::clone(&self.lanes) }
    }
}

impl<G: MutationGateway> LikeLanes<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway, lanes: Arc::default() }
    }

    /// Queues `request` behind earlier ones for the same recipe.
    ///
    /// The position in the lane is fixed when this is called, not when the
    /// returned future is first polled. Must be called inside a tokio runtime.
    pub fn submit(
        &self,
        request: LikeRequest,
        ctx: RequestContext,
    ) -> impl Future<Output = LikeResponse> + Send + 'static {
        let recipe_id = request.recipe_id.clone();
        let seq = request.seq;
        let (reply, answer) = oneshot::channel();
        {
            let mut lanes = self.lanes.lock().unwrap_or_else(PoisonError::into_inner);
            let lane = lanes
                .entry(recipe_id.clone())
                .or_insert_with(|| spawn_lane(self.gateway.clone()));
            if let Err(mpsc::error::SendError(job)) = lane.send((request, ctx, reply)) {
                let fresh = spawn_lane(self.gateway.clone());
                let _ = fresh.send(job);
                *lane = fresh;
            }
        }
        async move {
            answer.await.unwrap_or_else(|_| LikeResponse {
                recipe_id,
                seq,
                result: Err(GatewayError::Transient("like worker stopped".into())),
            })
        }
    }
}

fn spawn_lane<G: MutationGateway>(gateway: G) -> mpsc::UnboundedSender<Queued> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Queued>();
    tokio::spawn(async move {
        while let Some((request, ctx, reply)) = rx.recv().await {
            let _ = reply.send(request.send(&gateway, &ctx).await);
        }
    });
    tx
}
