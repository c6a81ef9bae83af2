//! Role-gated routes.

use facility_model::{User, UserRole};

use crate::session::SessionState;

const OPERATIONS: &[UserRole] = &[
    UserRole::Supervisor,
    UserRole::Admin,
    UserRole::Director,
    UserRole::Administrator,
];

const NURSING: &[UserRole] = &[UserRole::Nurse, UserRole::Director, UserRole::Administrator];

/// Every screen of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Unauthorized,
    Dashboard,
    AiChat,
    Tasks,
    DeepCleaning,
    Inspections,
    Maintenance,
    Inventory,
    Nursing,
    Performance,
    UserManagement,
    Audit,
}

impl Route {
    /// Sidebar entries in display order.
    pub const NAVIGATION: [Route; 11] = [
        Self::Dashboard,
        Self::AiChat,
        Self::Tasks,
        Self::DeepCleaning,
        Self::Inspections,
        Self::Maintenance,
        Self::Inventory,
        Self::Nursing,
        Self::Performance,
        Self::UserManagement,
        Self::Audit,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Unauthorized => "/unauthorized",
            Self::Dashboard => "/dashboard",
            Self::AiChat => "/dashboard/ai-chat",
            Self::Tasks => "/dashboard/tasks",
            Self::DeepCleaning => "/dashboard/deep-cleaning",
            Self::Inspections => "/dashboard/inspections",
            Self::Maintenance => "/dashboard/maintenance",
            Self::Inventory => "/dashboard/inventory",
            Self::Nursing => "/dashboard/nursing",
            Self::Performance => "/dashboard/performance",
            Self::UserManagement => "/dashboard/supervisor",
            Self::Audit => "/dashboard/audit",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Unauthorized => "Unauthorized",
            Self::Dashboard => "Dashboard",
            Self::AiChat => "AI Chat",
            Self::Tasks => "Daily Tasks",
            Self::DeepCleaning => "Deep Cleaning",
            Self::Inspections => "Inspections",
            Self::Maintenance => "Maintenance",
            Self::Inventory => "Inventory",
            Self::Nursing => "Nursing",
            Self::Performance => "Performance",
            Self::UserManagement => "User Management",
            Self::Audit => "Audit Compliance",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.trim_end_matches('/');
        [Self::Login, Self::Unauthorized]
            .into_iter()
            .chain(Self::NAVIGATION)
            .find(|route| route.path() == path)
    }

    /// Roles allowed in; `None` means any signed-in user. Login and
    /// unauthorized are not gated.
    pub fn allowed_roles(&self) -> Option<&'static [UserRole]> {
        match self {
            Self::Inspections | Self::Performance | Self::UserManagement | Self::Audit => {
                Some(OPERATIONS)
            }
            Self::Nursing => Some(NURSING),
            _ => None,
        }
    }

    pub fn is_gated(&self) -> bool {
        !matches!(self, Self::Login | Self::Unauthorized)
    }

    pub fn permits(&self, role: UserRole) -> bool {
        self.allowed_roles()
            .map_or(true, |roles| roles.contains(&role))
    }

    /// Sidebar entries shown to `role`.
    pub fn visible_for(role: UserRole) -> Vec<Route> {
        Self::NAVIGATION
            .into_iter()
            .filter(|route| route.permits(role))
            .collect()
    }
}

/// What a gated view does for the current session.
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision<'a> {
    /// Session still resolving; show the splash.
    Pending,
    Redirect(Route),
    Render(&'a User),
}

pub struct ViewGate;

impl ViewGate {
    /// Pending while loading, login when not authenticated, unauthorized
    /// when the role is not in `allowed` (`None` admits every role).
    pub fn evaluate<'a>(
        session: &'a SessionState,
        allowed: Option<&[UserRole]>,
    ) -> GateDecision<'a> {
        if session.loading() {
            return GateDecision::Pending;
        }
        let Some(user) = session.user() else {
            return GateDecision::Redirect(Route::Login);
        };
        match allowed {
            Some(roles) if !roles.contains(&user.role) => {
                GateDecision::Redirect(Route::Unauthorized)
            }
            _ => GateDecision::Render(user),
        }
    }

    pub fn evaluate_route(session: &SessionState, route: Route) -> GateDecision<'_> {
        Self::evaluate(session, route.allowed_roles())
    }

    /// Where the login page sends the session, if anywhere. A loaded
    /// profile goes straight to the dashboard.
    pub fn login_redirect(session: &SessionState) -> Option<Route> {
        session.is_authenticated().then_some(Route::Dashboard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use facility_model::UserId;

    fn user(role: UserRole) -> User {
        User {
            id: UserId::from("u1"),
            name: "Test User".into(),
            email: "t@example.com".into(),
            role,
            avatar_url: String::new(),
            created_at: None,
        }
    }

    fn authenticated(role: UserRole) -> SessionState {
        SessionState::Authenticated {
            identity: Identity::new("u1", None),
            user: user(role),
        }
    }

    #[test]
    fn loading_states_are_pending() {
        assert_eq!(
            ViewGate::evaluate(&SessionState::Unknown, None),
            GateDecision::Pending
        );
        let loading = SessionState::LoadingProfile {
            identity: Identity::new("u1", None),
        };
        assert_eq!(
            ViewGate::evaluate_route(&loading, Route::Audit),
            GateDecision::Pending
        );
    }

    #[test]
    fn unauthenticated_redirects_to_login() {
        assert_eq!(
            ViewGate::evaluate(&SessionState::Anonymous, None),
            GateDecision::Redirect(Route::Login)
        );
        let missing = SessionState::ProfileMissing {
            identity: Identity::new("u1", None),
        };
        assert_eq!(
            ViewGate::evaluate_route(&missing, Route::Dashboard),
            GateDecision::Redirect(Route::Login)
        );
    }

    #[test]
    fn wrong_role_redirects_to_unauthorized() {
        let housekeeper = authenticated(UserRole::Housekeeper);
        assert_eq!(
            ViewGate::evaluate_route(&housekeeper, Route::Audit),
            GateDecision::Redirect(Route::Unauthorized)
        );
        assert!(matches!(
            ViewGate::evaluate_route(&housekeeper, Route::Tasks),
            GateDecision::Render(u) if u.role == UserRole::Housekeeper
        ));

        let admin = authenticated(UserRole::Admin);
        assert_eq!(
            ViewGate::evaluate_route(&admin, Route::Nursing),
            GateDecision::Redirect(Route::Unauthorized)
        );
        let nurse = authenticated(UserRole::Nurse);
        assert!(matches!(
            ViewGate::evaluate_route(&nurse, Route::Nursing),
            GateDecision::Render(_)
        ));
    }

    #[test]
    fn sidebar_by_role() {
        let housekeeper: Vec<_> = Route::visible_for(UserRole::Housekeeper)
            .into_iter()
            .map(|r| r.label())
            .collect();
        assert_eq!(
            housekeeper,
            vec![
                "Dashboard",
                "AI Chat",
                "Daily Tasks",
                "Deep Cleaning",
                "Maintenance",
                "Inventory"
            ]
        );
        assert_eq!(Route::visible_for(UserRole::Director).len(), 11);
        assert_eq!(Route::visible_for(UserRole::Supervisor).len(), 10);
        assert!(Route::visible_for(UserRole::Nurse).contains(&Route::Nursing));
    }

    #[test]
    fn paths_round_trip() {
        for route in Route::NAVIGATION {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
        assert_eq!(Route::from_path("/dashboard/supervisor/"), Some(Route::UserManagement));
        assert_eq!(Route::from_path("/nowhere"), None);
        assert!(!Route::Login.is_gated());
    }

    #[test]
    fn login_page_forwards_signed_in_users() {
        assert_eq!(
            ViewGate::login_redirect(&authenticated(UserRole::Nurse)),
            Some(Route::Dashboard)
        );
        assert_eq!(ViewGate::login_redirect(&SessionState::Anonymous), None);
        assert_eq!(ViewGate::login_redirect(&SessionState::Unknown), None);
    }
}
