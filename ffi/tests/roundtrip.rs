//! Host-does-IO round-trip through the C ABI against the live mock server.
//!
//! Plays the part of a C host: builds requests through `dynrest_*`, executes
//! them with ureq, and feeds the responses back for formatting.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use dynrest_ffi::types::{
    FfiApiClient, FfiDataTag, FfiErrorCode, FfiHttpRequest, FfiHttpResponse, FfiResult,
};
use dynrest_ffi::*;

fn start_server() -> std::net::SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn text(ptr: *const c_char) -> String {
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string()
}

/// Execute an `FfiHttpRequest` with ureq, the way a C host would with its
/// own HTTP stack. Returns the status and body.
fn execute(req: &FfiHttpRequest) -> (u16, String) {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let method = text(req.method);
    let url = text(req.url);
    let headers: Vec<(String, String)> = if req.headers_len == 0 {
        Vec::new()
    } else {
        unsafe { std::slice::from_raw_parts(req.headers, req.headers_len as usize) }
            .iter()
            .map(|h| (text(h.key), text(h.value)))
            .collect()
    };
    let body = if req.body.is_null() {
        None
    } else {
        Some((text(req.content_type), text(req.body)))
    };

    let mut response = match (method.as_str(), body) {
        ("GET", None) => {
            let mut builder = agent.get(&url);
            for (k, v) in &headers {
                builder = builder.header(k.as_str(), v.as_str());
            }
            builder.call()
        }
        ("POST", Some((content_type, body))) | ("PATCH", Some((content_type, body))) => {
            let mut builder = if method == "POST" {
                agent.post(&url)
            } else {
                agent.patch(&url)
            };
            for (k, v) in &headers {
                builder = builder.header(k.as_str(), v.as_str());
            }
            builder.content_type(content_type.as_str()).send(body.as_bytes())
        }
        (other, _) => panic!("unexpected request shape for {other}"),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    (status, body)
}

fn build(client: *const FfiApiClient, action: &str, args: &str) -> *mut FfiResult {
    let action = CString::new(action).unwrap();
    let args = CString::new(args).unwrap();
    dynrest_build_call(client, action.as_ptr(), args.as_ptr())
}

fn finish(client: *const FfiApiClient, status: u16, body: &str) -> String {
    let body = CString::new(body).unwrap();
    let resp = FfiHttpResponse {
        status,
        body: body.as_ptr(),
    };
    let result = dynrest_finish_call(client, &resp);
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Ok, "finish failed");
    let out = text(r.data as *const c_char);
    dynrest_free_result(result);
    out
}

/// Route check, build, execute, finish: one full dynamic dispatch.
fn dispatch(client: *const FfiApiClient, action: &str, args: &str) -> String {
    let routes = dynrest_build_routes_request(client);
    if !routes.is_null() {
        let (status, body) = execute(unsafe { &*routes });
        dynrest_free_request(routes);

        let body = CString::new(body).unwrap();
        let resp = FfiHttpResponse {
            status,
            body: body.as_ptr(),
        };
        let c_action = CString::new(action).unwrap();
        let result = dynrest_route_allowed(client, c_action.as_ptr(), &resp);
        let allowed = text(unsafe { &*result }.data as *const c_char) == "true";
        dynrest_free_result(result);
        if !allowed {
            // Freeze the element as a regular dispatch would.
            dynrest_free_result(build(client, action, r#"["GET"]"#));
            let s = dynrest_route_not_found();
            let out = text(s);
            dynrest_free_string(s);
            return out;
        }
    }

    let result = build(client, action, args);
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Ok, "build failed");
    assert_eq!(r.data_tag, FfiDataTag::Request);
    let (status, body) = execute(unsafe { &*(r.data as *const FfiHttpRequest) });
    dynrest_free_result(result);
    finish(client, status, &body)
}

#[test]
fn dispatch_through_c_abi() {
    let addr = start_server();
    let config = CString::new(format!(
        r#"{{"host": "http://{addr}", "prefix": "/api", "actionRoutes": "routes"}}"#
    ))
    .unwrap();
    let client = dynrest_client_new(config.as_ptr());
    assert!(!client.is_null());

    let out = dispatch(client, "users", r#"["GET", ["42"]]"#);
    assert_eq!(out, r#"{"users":{"id":42,"name":"user-42"}}"#);

    let out = dispatch(client, "orders", r#"["GET"]"#);
    assert_eq!(out, r#"{"error":"Route not found!"}"#);

    let out = dispatch(client, "echo", r#"["POST", ["x"], {"a": "1"}, {"X-Trace": "t"}]"#);
    let echo: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(echo["users"]["path"], "/api/echo/x");
    assert_eq!(echo["users"]["body"], "a=1");
    assert_eq!(echo["users"]["headers"]["x-trace"], "t");

    dynrest_client_free(client);
}

#[test]
fn json_mode_with_basic_auth() {
    let addr = start_server();
    let config = CString::new(format!(
        r#"{{"host": "http://{addr}", "prefix": "/api", "namedReturn": false}}"#
    ))
    .unwrap();
    let client = dynrest_client_new(config.as_ptr());
    assert!(dynrest_client_to_json(client));
    let (user, pass) = (CString::new("u").unwrap(), CString::new("p").unwrap());
    assert!(dynrest_client_auth(client, user.as_ptr(), pass.as_ptr(), std::ptr::null()));

    let out = dispatch(client, "echo", r#"["PATCH", [], {"qty": 3}]"#);
    let echo: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(echo["method"], "PATCH");
    assert_eq!(echo["content_type"], "application/json");
    assert_eq!(echo["body"], r#"{"qty":3}"#);
    assert_eq!(echo["authorization"], "Basic dTpw");

    dynrest_client_free(client);
}
