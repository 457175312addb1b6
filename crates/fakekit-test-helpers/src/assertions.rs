//! Assertion macros over recorded calls.
//!
//! The macros work with anything exposing `count_calls(&str) -> usize` and,
//! for [`assert_call_args!`](crate::assert_call_args), `args::<A>(&str, usize)`
//! returning a `Result`. Every fake's `TestProxy` qualifies.

/// Assert that `method` was recorded exactly `times` times.
///
/// ```rust
/// use fakekit_test_helpers::assert_called;
///
/// struct Log(usize);
/// impl Log {
///     fn count_calls(&self, _method: &str) -> usize { self.0 }
/// }
///
/// assert_called!(Log(2), "get_scanners", 2);
/// ```
#[macro_export]
macro_rules! assert_called {
    ($proxy:expr, $method:expr, $times:expr $(,)?) => {
        let proxy = &$proxy;
        let method: &str = $method;
        let expected: usize = $times;
        let actual = proxy.count_calls(method);
        if actual != expected {
            panic!(
                "assertion failed: `{}` called {} time(s), expected {}",
                method, actual, expected
            );
        }
    };
    ($proxy:expr, $method:expr $(,)?) => {
        let proxy = &$proxy;
        let method: &str = $method;
        if proxy.count_calls(method) == 0 {
            panic!("assertion failed: `{}` was never called", method);
        }
    };
}

/// Assert that `method` was never recorded.
#[macro_export]
macro_rules! assert_not_called {
    ($proxy:expr, $method:expr $(,)?) => {
        let proxy = &$proxy;
        let method: &str = $method;
        let actual = proxy.count_calls(method);
        if actual != 0 {
            panic!(
                "assertion failed: `{}` was called {} time(s), expected none",
                method, actual
            );
        }
    };
}

/// Assert the arguments of the `index`-th call to `method`.
#[macro_export]
macro_rules! assert_call_args {
    ($proxy:expr, $method:expr, $index:expr, $expected:expr $(,)?) => {
        let proxy = &$proxy;
        let method: &str = $method;
        let index: usize = $index;
        let expected = $expected;
        match proxy.args(method, index) {
            Ok(actual) => {
                let actual = $crate::assertions::same_type(&expected, actual);
                if actual != expected {
                    panic!(
                        "assertion failed: call {} to `{}`\n  actual: `{:?}`,\nexpected: `{:?}`",
                        index, method, actual, expected
                    );
                }
            }
            Err(err) => panic!(
                "assertion failed: call {} to `{}` unavailable: {}",
                index, method, err
            ),
        }
    };
}

#[doc(hidden)]
pub fn same_type<T>(_expected: &T, actual: T) -> T {
    actual
}
