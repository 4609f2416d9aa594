//! Ergonomic testing utilities for reducers
//!
//! This module provides a fluent API for testing reducers with readable Given-When-Then syntax.

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use checkin_core::effect::Effects;
use checkin_core::{effect::Effect, reducer::Reducer};
use std::fmt::Debug;

/// Type alias for state assertion functions
type StateAssertion<S> = Box<dyn FnOnce(&S)>;

/// Type alias for effect assertion functions
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Type alias for error assertion functions
type ErrorAssertion<Err> = Box<dyn FnOnce(&Err)>;

/// Fluent API for testing reducers with Given-When-Then syntax
///
/// # Example
///
/// ```ignore
/// use checkin_testing::ReducerTest;
///
/// ReducerTest::new(LifecycleReducer)
///     .with_env(LifecycleEnvironment::new(Arc::new(test_clock())))
///     .given_state(ticket)
///     .when_action(LifecycleAction::CheckIn)
///     .then_state(|ticket| assert!(ticket.check_in.is_none()))
///     .then_effects(|effects| assertions::assert_remote_call(effects, "update_ticket"))
///     .run();
/// ```
pub struct ReducerTest<R>
where
    R: Reducer,
{
    reducer: R,
    environment: Option<R::Environment>,
    initial_state: Option<R::State>,
    action: Option<R::Action>,
    state_assertions: Vec<StateAssertion<R::State>>,
    effect_assertions: Vec<EffectAssertion<R::Action>>,
    error_assertions: Vec<ErrorAssertion<R::Error>>,
}

impl<R> ReducerTest<R>
where
    R: Reducer,
    R::Action: Debug,
    R::Error: Debug,
{
    /// Create a new reducer test with the given reducer
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
            error_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test
    #[must_use]
    pub fn with_env(mut self, env: R::Environment) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given)
    #[must_use]
    pub fn given_state(mut self, state: R::State) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the action to test (When)
    #[must_use]
    pub fn when_action(mut self, action: R::Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion about the resulting state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&R::State) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the resulting effects; the action must be accepted
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<R::Action>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion about the refusal; the action must be refused
    #[must_use]
    pub fn then_error<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&R::Error) + 'static,
    {
        self.error_assertions.push(Box::new(assertion));
        self
    }

    /// Run the test and execute all assertions
    ///
    /// # Panics
    ///
    /// Panics if initial state, action, or environment is not set, if the
    /// outcome is not the one the assertions expect, or if any assertion fails.
    #[allow(clippy::panic)] // Test code can panic
    #[allow(clippy::expect_used)] // Test code can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("Initial state must be set with given_state()");

        let action = self.action.expect("Action must be set with when_action()");

        let env = self
            .environment
            .expect("Environment must be set with with_env()");

        // Execute reducer
        let outcome: Result<Effects<R::Action>, R::Error> =
            self.reducer.reduce(&mut state, action, &env);

        // Run state assertions
        for assertion in self.state_assertions {
            assertion(&state);
        }

        match outcome {
            Ok(effects) => {
                assert!(
                    self.error_assertions.is_empty(),
                    "Expected the action to be refused, but it produced {effects:?}"
                );
                for assertion in self.effect_assertions {
                    assertion(&effects);
                }
            }
            Err(error) => {
                assert!(
                    self.effect_assertions.is_empty(),
                    "Expected effects, but the action was refused: {error:?}"
                );
                for assertion in self.error_assertions {
                    assertion(&error);
                }
            }
        }
    }
}

/// Helper assertions for effects
pub mod assertions {
    use checkin_core::effect::Effect;

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.is_empty() || matches!(effects, [Effect::None]),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain a remote call with the given name
    ///
    /// # Panics
    ///
    /// Panics if no remote effect carries a call named `name`.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_remote_call<A>(effects: &[Effect<A>], name: &str) {
        let names: Vec<&str> = effects
            .iter()
            .filter_map(Effect::remote_call)
            .map(checkin_core::remote::RemoteCall::name)
            .collect();
        assert!(
            names.contains(&name),
            "Expected a {name} remote call, but found {names:?}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checkin_core::remote::{RemoteCall, TicketUpdateRequest};
    use checkin_core::smallvec;
    use checkin_core::types::TicketId;

    #[derive(Clone, Debug)]
    struct TestState {
        confirmed: u32,
    }

    #[derive(Clone, Debug)]
    enum TestAction {
        Request,
        Confirmed,
        Refuse,
    }

    struct TestReducer;

    struct TestEnv;

    impl Reducer for TestReducer {
        type State = TestState;
        type Action = TestAction;
        type Environment = TestEnv;
        type Error = String;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> Result<Effects<Self::Action>, Self::Error> {
            match action {
                TestAction::Request => Ok(smallvec![Effect::remote(
                    RemoteCall::UpdateTicket(TicketUpdateRequest {
                        id: TicketId::new("t1"),
                        title: String::new(),
                        first_name: String::new(),
                        last_name: String::new(),
                        email: String::new(),
                        check_in: None,
                        check_out: None,
                    }),
                    TestAction::Confirmed,
                )]),
                TestAction::Confirmed => {
                    state.confirmed += 1;
                    Ok(smallvec![])
                }
                TestAction::Refuse => Err("refused".to_string()),
            }
        }
    }

    #[test]
    fn command_produces_remote_effect_without_state_change() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { confirmed: 0 })
            .when_action(TestAction::Request)
            .then_state(|state| assert_eq!(state.confirmed, 0))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_remote_call(effects, "update_ticket");
            })
            .run();
    }

    #[test]
    fn event_updates_state() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { confirmed: 2 })
            .when_action(TestAction::Confirmed)
            .then_state(|state| assert_eq!(state.confirmed, 3))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn refusal_is_reported() {
        ReducerTest::new(TestReducer)
            .with_env(TestEnv)
            .given_state(TestState { confirmed: 0 })
            .when_action(TestAction::Refuse)
            .then_error(|error| assert_eq!(error, "refused"))
            .run();
    }
}
