/*! Integration tests for VAB.
 *
 * This test suite is organized as a single integration test binary
 * following the pattern described by matklad in
 * https://matklad.github.io/2021/02/27/delete-cargo-integration-tests.html
 *
 * The module structure mirrors the transport surface of the library:
 * - basyx: round trips over the framed binary TCP transport
 * - http: round trips over the HTTP verb mapping
 * - gateway: nested-address forwarding across servers
 *
 * Handler, node, path, serializer, and metaprotocol behavior is covered by
 * unit tests next to the respective modules; this binary exercises the
 * full client-to-server stack over real sockets.
 */

use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("vab=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

mod basyx;
mod gateway;
mod helpers;
mod http;
