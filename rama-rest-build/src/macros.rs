/// Generate a `with_*` builder method and its `set_*` counterpart
/// from a single consuming definition.
macro_rules! generate_set_and_with {
    (
        $(#[$outer_doc:meta])*
        $vis:vis fn $fn_name:ident(mut $self_token:ident) -> Self {
            $($body:tt)*
        }
    ) => {
        ::paste::paste! {
            $(#[$outer_doc])*
            #[must_use]
            $vis fn [<with_ $fn_name>](mut $self_token) -> Self {
                $($body)*
            }

            $(#[$outer_doc])*
            $vis fn [<set_ $fn_name>](&mut $self_token) -> &mut Self {
                $($body)*
            }
        }
    };
    (
        $(#[$outer_doc:meta])*
        $vis:vis fn $fn_name:ident(mut $self_token:ident, $($param_name:ident: $param_ty:ty),+ $(,)?) -> Self {
            $($body:tt)*
        }
    ) => {
        ::paste::paste! {
            $(#[$outer_doc])*
            #[must_use]
            $vis fn [<with_ $fn_name>](mut $self_token, $($param_name: $param_ty),+) -> Self {
                $($body)*
            }

            $(#[$outer_doc])*
            $vis fn [<set_ $fn_name>](&mut $self_token, $($param_name: $param_ty),+) -> &mut Self {
                $($body)*
            }
        }
    };
}

pub(crate) use generate_set_and_with;
