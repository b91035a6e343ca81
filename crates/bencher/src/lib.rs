#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    table: RouteTable,
}

impl TestCase {
    pub fn new(name: &'static str, table: RouteTable) -> Self {
        Self { name, table }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }
}

/// Registered `GET` patterns and the request paths looked up against them.
#[derive(Debug, Copy, Clone)]
pub struct RouteTable {
    patterns: &'static [&'static str],
    lookups: &'static [&'static str],
}

impl RouteTable {
    pub const fn new(patterns: &'static [&'static str], lookups: &'static [&'static str]) -> Self {
        Self { patterns, lookups }
    }

    pub fn patterns(&self) -> &'static [&'static str] {
        self.patterns
    }

    pub fn lookups(&self) -> &'static [&'static str] {
        self.lookups
    }
}

pub static STATIC_SITE: RouteTable = RouteTable::new(
    &["/", "/about", "/blog", "/blog/archive", "/contact", "/docs", "/docs/guide", "/docs/api", "/static/*file"],
    &["/", "/about", "/docs/guide", "/blog/archive", "/static/css/site.css", "/missing"],
);

pub static REST_API: RouteTable = RouteTable::new(
    &[
        "/authorizations",
        "/authorizations/:id",
        "/applications/:client_id/tokens/:access_token",
        "/events",
        "/repos/:owner/:repo/events",
        "/networks/:owner/:repo/events",
        "/orgs/:org/events",
        "/users/:user/received_events",
        "/users/:user/received_events/public",
        "/users/:user/events",
        "/users/:user/events/public",
        "/users/:user/events/orgs/:org",
        "/feeds",
        "/notifications",
        "/repos/:owner/:repo/notifications",
        "/notifications/threads/:id",
        "/notifications/threads/:id/subscription",
        "/repos/:owner/:repo/stargazers",
        "/users/:user/starred",
        "/user/starred",
        "/user/starred/:owner/:repo",
        "/repos/:owner/:repo/subscribers",
        "/users/:user/subscriptions",
        "/user/subscriptions",
        "/repos/:owner/:repo/subscription",
        "/users/:user/gists",
        "/gists",
        "/gists/:id",
        "/gists/:id/star",
        "/repos/:owner/:repo/git/blobs/:sha",
        "/repos/:owner/:repo/git/commits/:sha",
        "/repos/:owner/:repo/git/refs",
        "/repos/:owner/:repo/git/tags/:sha",
        "/repos/:owner/:repo/git/trees/:sha",
        "/issues",
        "/user/issues",
        "/orgs/:org/issues",
        "/repos/:owner/:repo/issues",
        "/repos/:owner/:repo/issues/:number",
        "/repos/:owner/:repo/assignees",
        "/repos/:owner/:repo/assignees/:assignee",
        "/repos/:owner/:repo/issues/:number/comments",
        "/repos/:owner/:repo/issues/:number/events",
        "/repos/:owner/:repo/labels",
        "/repos/:owner/:repo/labels/:name",
        "/repos/:owner/:repo/milestones",
        "/repos/:owner/:repo/milestones/:number",
        "/users/:user",
        "/user",
        "/users",
        "/search/repositories",
        "/search/code",
        "/search/issues",
        "/search/users",
        "/legacy/issues/search/:owner/:repository/:state/:keyword",
        "/repos/:owner/:repo/contents/*path",
    ],
    &[
        "/user",
        "/users/jon",
        "/repos/labstack/echo/issues/42/comments",
        "/repos/labstack/echo/git/trees/c0ffee",
        "/legacy/issues/search/labstack/echo/open/router",
        "/repos/labstack/echo/contents/docs/guide/routing.md",
        "/notifications/threads/7/subscription",
        "/repos/labstack/echo/unknown",
    ],
);
