use crate::session::SessionStore;

/// Console screens. Paths mirror the web dashboard's route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    EmailVerify,
    NotFound,
    Dashboard,
    Sites,
    VerifyGigs,
    Workers,
    Payments,
    Profile,
    Analytics,
}

impl Route {
    pub const ALL: [Route; 11] = [
        Route::Login,
        Route::Register,
        Route::EmailVerify,
        Route::NotFound,
        Route::Dashboard,
        Route::Sites,
        Route::VerifyGigs,
        Route::Workers,
        Route::Payments,
        Route::Profile,
        Route::Analytics,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Register => "/register",
            Route::EmailVerify => "/email-verify",
            Route::NotFound => "/404",
            Route::Dashboard => "/main-menu",
            Route::Sites => "/main-menu/add-sites",
            Route::VerifyGigs => "/main-menu/verify-gigs",
            Route::Workers => "/main-menu/manage-workers",
            Route::Payments => "/main-menu/mpesa-payments",
            Route::Profile => "/main-menu/update-profile",
            Route::Analytics => "/main-menu/analytics",
        }
    }

    /// Unknown paths resolve to [`Route::NotFound`].
    pub fn from_path(path: &str) -> Route {
        let trimmed = path.trim_end_matches('/');
        let trimmed = if trimmed.is_empty() { "/" } else { trimmed };
        Self::ALL
            .into_iter()
            .find(|route| route.path().eq_ignore_ascii_case(trimmed))
            .unwrap_or(Route::NotFound)
    }

    pub fn requires_session(self) -> bool {
        !matches!(
            self,
            Route::Login | Route::Register | Route::EmailVerify | Route::NotFound
        )
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Login => "Sign in",
            Route::Register => "Create account",
            Route::EmailVerify => "Verify email",
            Route::NotFound => "Not found",
            Route::Dashboard => "Jenga Pro",
            Route::Sites => "Manage Sites",
            Route::VerifyGigs => "Verify Gigs",
            Route::Workers => "Manage Workers",
            Route::Payments => "MPESA Payments",
            Route::Profile => "Update Profile",
            Route::Analytics => "Analytics",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(Route),
}

/// Local, advisory check: a gated route without any credential is sent to
/// sign-in before a single request is issued.
pub async fn guard(route: Route, session: &SessionStore) -> GateDecision {
    if route.requires_session() && !session.has_valid().await {
        GateDecision::Redirect(Route::Login)
    } else {
        GateDecision::Allow
    }
}
