//! Reducer composition
//!
//! - **`combine_reducers`**: run several reducers over one state and action
//! - **`scope_reducer`**: Embed a slice reducer into the root state and action
//!
//! The marketplace root reducer is built by scoping each slice reducer onto
//! its field of the root state and combining the results.

use crate::effect::Effect;
use crate::reducer::Reducer;
use smallvec::SmallVec;

/// A type-erased reducer that can be shared across tasks
pub type BoxedReducer<S, A, E> =
    Box<dyn Reducer<State = S, Action = A, Environment = E> + Send + Sync>;

/// Runs several reducers over the same state, in order.
///
/// Every reducer sees its own clone of the action. Their effects are
/// concatenated in reducer order.
///
/// # Examples
///
/// ```
/// use marketplace_core::composition::{BoxedReducer, combine_reducers};
/// use marketplace_core::{effect::Effect, reducer::Reducer, SmallVec};
///
/// #[derive(Default)]
/// struct Badge {
///     seen: u32,
///     dismissed: bool,
/// }
///
/// #[derive(Clone)]
/// enum BadgeAction {
///     Seen,
///     Dismiss,
/// }
///
/// struct SeenReducer;
/// struct DismissReducer;
///
/// impl Reducer for SeenReducer {
///     type State = Badge;
///     type Action = BadgeAction;
///     type Environment = ();
///
///     fn reduce(&self, state: &mut Badge, action: BadgeAction, _env: &()) -> SmallVec<[Effect<BadgeAction>; 4]> {
///         if matches!(action, BadgeAction::Seen) {
///             state.seen += 1;
///         }
///         SmallVec::new()
///     }
/// }
///
/// impl Reducer for DismissReducer {
///     type State = Badge;
///     type Action = BadgeAction;
///     type Environment = ();
///
///     fn reduce(&self, state: &mut Badge, action: BadgeAction, _env: &()) -> SmallVec<[Effect<BadgeAction>; 4]> {
///         if matches!(action, BadgeAction::Dismiss) {
///             state.dismissed = true;
///         }
///         SmallVec::new()
///     }
/// }
///
/// let mut reducers: Vec<BoxedReducer<Badge, BadgeAction, ()>> = Vec::new();
/// reducers.push(Box::new(SeenReducer));
/// reducers.push(Box::new(DismissReducer));
///
/// let combined = combine_reducers(reducers);
/// let mut badge = Badge::default();
/// let _ = combined.reduce(&mut badge, BadgeAction::Seen, &());
/// let _ = combined.reduce(&mut badge, BadgeAction::Dismiss, &());
/// assert_eq!(badge.seen, 1);
/// assert!(badge.dismissed);
/// ```
#[must_use]
pub fn combine_reducers<S, A, E>(reducers: Vec<BoxedReducer<S, A, E>>) -> CombinedReducer<S, A, E>
where
    A: Clone,
{
    CombinedReducer { reducers }
}

/// Reducers sharing one state, run in registration order.
///
/// Created by [`combine_reducers`].
pub struct CombinedReducer<S, A, E> {
    reducers: Vec<BoxedReducer<S, A, E>>,
}

impl<S, A, E> CombinedReducer<S, A, E> {
    /// Number of reducers combined
    #[must_use]
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Whether no reducer has been combined
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl<S, A, E> Reducer for CombinedReducer<S, A, E>
where
    A: Clone,
{
    type State = S;
    type Action = A;
    type Environment = E;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        self.reducers
            .iter()
            .flat_map(|reducer| reducer.reduce(state, action.clone(), env))
            .collect()
    }
}

/// Scopes a slice reducer to a field of a larger state and action.
///
/// - `state` focuses the parent state on the child slice
/// - `extract` pulls the child action out of a parent action (ignoring others)
/// - `embed` wraps child actions produced by effects back into the parent type
///
/// # Examples
///
/// ```
/// use marketplace_core::composition::scope_reducer;
/// use marketplace_core::{effect::Effect, reducer::Reducer, SmallVec};
///
/// #[derive(Default)]
/// struct Wishlist {
///     ids: Vec<u64>,
/// }
///
/// #[derive(Clone, Debug)]
/// struct Wish(u64);
///
/// struct WishlistReducer;
///
/// impl Reducer for WishlistReducer {
///     type State = Wishlist;
///     type Action = Wish;
///     type Environment = ();
///
///     fn reduce(&self, list: &mut Wishlist, wish: Wish, _env: &()) -> SmallVec<[Effect<Wish>; 4]> {
///         list.ids.push(wish.0);
///         SmallVec::new()
///     }
/// }
///
/// #[derive(Default)]
/// struct Shop {
///     wishlist: Wishlist,
///     banner: String,
/// }
///
/// #[derive(Clone, Debug)]
/// enum ShopAction {
///     Wishlist(Wish),
///     Announce(String),
/// }
///
/// let scoped = scope_reducer(
///     WishlistReducer,
///     |shop: &mut Shop| &mut shop.wishlist,
///     |action| match action {
///         ShopAction::Wishlist(wish) => Some(wish),
///         ShopAction::Announce(_) => None,
///     },
///     ShopAction::Wishlist,
/// );
///
/// let mut shop = Shop::default();
/// let _ = scoped.reduce(&mut shop, ShopAction::Wishlist(Wish(4)), &());
/// let _ = scoped.reduce(&mut shop, ShopAction::Announce("sale".into()), &());
/// assert_eq!(shop.wishlist.ids, vec![4]);
/// assert!(shop.banner.is_empty());
/// ```
pub fn scope_reducer<S, A, R>(
    reducer: R,
    state: fn(&mut S) -> &mut R::State,
    extract: fn(A) -> Option<R::Action>,
    embed: fn(R::Action) -> A,
) -> ScopedReducer<S, A, R>
where
    R: Reducer,
{
    ScopedReducer {
        reducer,
        state,
        extract,
        embed,
    }
}

/// A reducer focused on one slice of a larger state.
///
/// Created by [`scope_reducer`].
pub struct ScopedReducer<S, A, R>
where
    R: Reducer,
{
    reducer: R,
    state: fn(&mut S) -> &mut R::State,
    extract: fn(A) -> Option<R::Action>,
    embed: fn(R::Action) -> A,
}

impl<S, A, R> Reducer for ScopedReducer<S, A, R>
where
    R: Reducer,
    R::Action: Send + 'static,
    A: Send + 'static,
{
    type State = S;
    type Action = A;
    type Environment = R::Environment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let Some(child_action) = (self.extract)(action) else {
            return SmallVec::new();
        };

        let child_state = (self.state)(state);
        self.reducer
            .reduce(child_state, child_action, env)
            .into_iter()
            .map(|effect| effect.map(self.embed))
            .collect()
    }
}
