//! Macros for declaring state identities.

/// Declare a fieldless enum of state identities and implement
/// [`State`](crate::core::State) for it.
///
/// Each variant's name is its identifier unless overridden with
/// `Variant = "display name"`. The generated enum derives `Copy`, `Eq` and
/// `Hash` and lists every variant in an associated `ALL` constant.
///
/// # Example
///
/// ```
/// use stateloom::core::State;
/// use stateloom::state_enum;
///
/// state_enum! {
///     /// Phases of a wash cycle.
///     pub enum Wash {
///         Fill,
///         Agitate = "agitating",
///         Drain,
///     }
/// }
///
/// assert_eq!(Wash::Fill.name(), "Fill");
/// assert_eq!(Wash::Agitate.name(), "agitating");
/// assert_eq!(Wash::ALL, &[Wash::Fill, Wash::Agitate, Wash::Drain]);
/// ```
#[macro_export]
macro_rules! state_enum {
    (@display $variant:ident $display:literal) => {
        $display
    };
    (@display $variant:ident) => {
        stringify!($variant)
    };

    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $(= $display:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            /// Every state, in declaration order.
            #[allow(dead_code)]
            pub const ALL: &'static [$name] = &[$(Self::$variant),*];
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => $crate::state_enum!(@display $variant $($display)?)),*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::core::State;

    state_enum! {
        enum TestState {
            Initial,
            Processing = "busy",
            Complete,
        }
    }

    #[test]
    fn state_enum_macro_generates_trait() {
        assert_eq!(TestState::Initial.name(), "Initial");
        assert_eq!(TestState::Processing.name(), "busy");
        assert_eq!(TestState::Complete.name(), "Complete");
    }

    #[test]
    fn state_enum_lists_every_variant() {
        assert_eq!(
            TestState::ALL,
            &[TestState::Initial, TestState::Processing, TestState::Complete]
        );
    }

    #[test]
    fn state_enum_supports_visibility() {
        state_enum! {
            pub enum PublicState {
                A,
                B,
            }
        }

        let state = PublicState::B;
        assert_eq!(state.name(), "B");
    }

    #[test]
    fn generated_states_serialize_by_variant() {
        let json = serde_json::to_string(&TestState::Processing).unwrap();
        assert_eq!(json, "\"Processing\"");
        let back: TestState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TestState::Processing);
    }
}
