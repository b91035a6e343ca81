use super::Context;
use crate::error::Error;
use cookie::Cookie;
use http::header::{HeaderValue, COOKIE, SET_COOKIE};
use tracing::debug;

impl Context {
    /// The request cookie named `name`.
    ///
    /// # Errors
    /// Returns [`Error::CookieNotFound`] when the request carries no such cookie.
    pub fn cookie(&self, name: &str) -> Result<Cookie<'static>, Error> {
        self.cookies().into_iter().find(|cookie| cookie.name() == name).ok_or_else(|| Error::cookie_not_found(name))
    }

    /// All cookies sent with the request, in header order. Malformed pairs are skipped.
    pub fn cookies(&self) -> Vec<Cookie<'static>> {
        self.request
            .headers()
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|header| Cookie::split_parse(header.to_owned()))
            .filter_map(|cookie| {
                cookie.map_err(|e| debug!(cause = %e, "skip malformed cookie")).ok()
            })
            .collect()
    }

    /// Adds a `Set-Cookie` header to the response.
    ///
    /// # Errors
    /// Returns an error when the serialized cookie is not a valid header value.
    pub fn set_cookie(&mut self, cookie: &Cookie<'_>) -> Result<(), Error> {
        let value = HeaderValue::from_str(&cookie.to_string())?;
        self.response.headers_mut().append(SET_COOKIE, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::context::tests::{context, request};
    use cookie::time::OffsetDateTime;
    use cookie::Cookie;
    use http::header::{COOKIE, SET_COOKIE};
    use http::Method;

    #[test]
    fn read_cookies() {
        let mut req = request(Method::GET, "/");
        req.headers_mut().append(COOKIE, "theme=light".parse().unwrap());
        req.headers_mut().append(COOKIE, "user=Jon Snow".parse().unwrap());
        let ctx = context(req);

        let theme = ctx.cookie("theme").unwrap();
        assert_eq!(theme.value(), "light");
        let user = ctx.cookie("user").unwrap();
        assert_eq!(user.value(), "Jon Snow");

        let names: Vec<_> = ctx.cookies().iter().map(|c| c.name().to_owned()).collect();
        assert_eq!(names, ["theme", "user"]);

        assert!(matches!(ctx.cookie("missing"), Err(crate::Error::CookieNotFound { name }) if name == "missing"));
    }

    #[test]
    fn several_cookies_in_one_header() {
        let mut req = request(Method::GET, "/");
        req.headers_mut().insert(COOKIE, "a=1; b=2".parse().unwrap());
        let ctx = context(req);

        assert_eq!(ctx.cookies().len(), 2);
        assert_eq!(ctx.cookie("b").unwrap().value(), "2");
    }

    #[test]
    fn set_cookie() {
        let mut ctx = context(request(Method::GET, "/"));
        let cookie = Cookie::build(("SSID", "Ap4PGTEq"))
            .domain("labstack.com")
            .path("/")
            .expires(OffsetDateTime::now_utc())
            .secure(true)
            .http_only(true)
            .build();

        ctx.set_cookie(&cookie).unwrap();
        ctx.set_cookie(&Cookie::new("theme", "dark")).unwrap();

        let values: Vec<_> = ctx.response().headers().get_all(SET_COOKIE).iter().map(|v| v.to_str().unwrap()).collect();
        assert_eq!(values.len(), 2);
        assert!(values[0].starts_with("SSID=Ap4PGTEq"));
        assert!(values[0].contains("Domain=labstack.com"));
        assert!(values[0].contains("Path=/"));
        assert!(values[0].contains("Secure"));
        assert!(values[0].contains("HttpOnly"));
        assert!(values[0].contains("Expires="));
        assert_eq!(values[1], "theme=dark");
    }
}
