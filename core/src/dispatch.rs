//! Named-method front end for `ApiClient`.
//!
//! Rust has no hook for calls to undefined methods, so action names are
//! declared up front with [`api_actions!`](crate::api_actions). Each
//! declared method forwards its own name to [`Invoke::invoke`].

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::Transport;
use crate::types::Call;

/// Anything that can dispatch an action by name.
pub trait Invoke {
    fn invoke(&self, action: &str, call: Call) -> Result<String, ApiError>;
}

impl<T: Transport> Invoke for ApiClient<T> {
    fn invoke(&self, action: &str, call: Call) -> Result<String, ApiError> {
        ApiClient::invoke(self, action, call)
    }
}

/// Declare an extension trait with one method per action.
///
/// ```
/// use dynrest_core::{api_actions, ApiClient, Call, ClientConfig, Detached};
///
/// api_actions! {
///     /// Endpoints of the shop API.
///     pub trait ShopApi { users, items }
/// }
///
/// let client = ApiClient::new(ClientConfig::new("http://shop.test"), Detached);
/// // Sends `GET http://shop.test/users/42`; fails here because no
/// // transport is attached.
/// assert!(client.users(Call::get().segment("42")).is_err());
/// ```
#[macro_export]
macro_rules! api_actions {
    ($(#[$meta:meta])* $vis:vis trait $name:ident { $($action:ident),* $(,)? }) => {
        $(#[$meta])*
        $vis trait $name: $crate::Invoke {
            $(
                fn $action(
                    &self,
                    call: $crate::Call,
                ) -> ::std::result::Result<::std::string::String, $crate::ApiError> {
                    $crate::Invoke::invoke(self, ::std::stringify!($action), call)
                }
            )*
        }

        impl<T: $crate::Invoke + ?::std::marker::Sized> $name for T {}
    };
}
