//! Macros for declaring state enums.

/// Declare an enum of states and implement `State` for it.
///
/// Each variant is given the name it is known by in messages and timestamp
/// slot names.
///
/// # Example
///
/// ```
/// use statebound::state_enum;
/// use statebound::core::State;
///
/// state_enum! {
///     pub enum OrderState {
///         Placed => "placed",
///         Shipped => "shipped",
///     }
/// }
///
/// assert_eq!(OrderState::Shipped.name(), "shipped");
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident => $label:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => $label),*
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
            Unborn => "unborn",
            Born => "born",
            GrownUp => "grown_up",
        }
    }

    #[test]
    fn state_enum_macro_generates_trait() {
        assert_eq!(TestState::Unborn.name(), "unborn");
        assert_eq!(TestState::Born.name(), "born");
        assert_eq!(TestState::GrownUp.name(), "grown_up");
    }

    #[test]
    fn state_enum_supports_visibility_and_attributes() {
        state_enum! {
            /// Employment states.
            pub enum PublicState {
                Hired => "hired",
                #[allow(dead_code)]
                Fired => "fired",
            }
        }

        assert_eq!(PublicState::Hired.name(), "hired");
    }

    #[test]
    fn state_enum_serializes() {
        let json = serde_json::to_string(&TestState::GrownUp).unwrap();
        let back: TestState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, TestState::GrownUp);
    }
}
