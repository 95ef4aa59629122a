//! External symbol resolution against a fixed whitelist (spec §4.5 step
//! 4). Nothing a Reactor routine calls out to can be anything other than
//! one of these names — there is no general dynamic-linking surface, by
//! design, so a shader that somehow asked for an arbitrary libc symbol
//! would fail to resolve rather than silently get it.

#[derive(Debug, Clone, Copy)]
pub struct ExternSymbol {
    pub name: &'static str,
    pub addr: *const (),
}

// SAFETY: these are plain function pointers to code living in the
// program's own address space (libm shims or this crate's own print
// entry); they are never mutated after construction.
unsafe impl Send for ExternSymbol {}
unsafe impl Sync for ExternSymbol {}

// `libm`'s functions use Rust's default calling convention; the JIT calls
// out to them with a C calling convention (the only one the backend's
// call-instruction encoder knows), so each gets a one-line `extern "C"`
// shim rather than a direct cast.
extern "C" fn shim_floorf(x: f32) -> f32 {
    libm::floorf(x)
}
extern "C" fn shim_ceilf(x: f32) -> f32 {
    libm::ceilf(x)
}
extern "C" fn shim_truncf(x: f32) -> f32 {
    libm::truncf(x)
}
extern "C" fn shim_nearbyintf(x: f32) -> f32 {
    libm::roundf(x)
}
extern "C" fn shim_sinf(x: f32) -> f32 {
    libm::sinf(x)
}
extern "C" fn shim_cosf(x: f32) -> f32 {
    libm::cosf(x)
}
extern "C" fn shim_tanf(x: f32) -> f32 {
    libm::tanf(x)
}
extern "C" fn shim_powf(x: f32, y: f32) -> f32 {
    libm::powf(x, y)
}
extern "C" fn shim_expf(x: f32) -> f32 {
    libm::expf(x)
}
extern "C" fn shim_exp2f(x: f32) -> f32 {
    libm::exp2f(x)
}
extern "C" fn shim_logf(x: f32) -> f32 {
    libm::logf(x)
}
extern "C" fn shim_log2f(x: f32) -> f32 {
    libm::log2f(x)
}
extern "C" fn shim_sqrtf(x: f32) -> f32 {
    libm::sqrtf(x)
}
extern "C" fn shim_floor(x: f64) -> f64 {
    libm::floor(x)
}
extern "C" fn shim_ceil(x: f64) -> f64 {
    libm::ceil(x)
}
extern "C" fn shim_trunc(x: f64) -> f64 {
    libm::trunc(x)
}
extern "C" fn shim_nearbyint(x: f64) -> f64 {
    libm::round(x)
}
extern "C" fn shim_sin(x: f64) -> f64 {
    libm::sin(x)
}
extern "C" fn shim_cos(x: f64) -> f64 {
    libm::cos(x)
}
extern "C" fn shim_pow(x: f64, y: f64) -> f64 {
    libm::pow(x, y)
}
extern "C" fn shim_exp(x: f64) -> f64 {
    libm::exp(x)
}
extern "C" fn shim_log(x: f64) -> f64 {
    libm::log(x)
}
extern "C" fn shim_sqrt(x: f64) -> f64 {
    libm::sqrt(x)
}

macro_rules! sym {
    ($name:literal, $f:expr) => {
        ExternSymbol { name: $name, addr: $f as *const () }
    };
}

/// The whitelist. `libm`'s portable implementations back the float
/// transcendentals so the JIT never needs libc's (which may differ in
/// rounding across platforms); `printf` and the runtime's own print entry
/// exist purely for shader debug builds and are resolved by the embedding
/// runtime rather than listed here (they carry varargs, which this
/// table's fixed-arity shims can't express).
pub fn whitelist() -> Vec<ExternSymbol> {
    vec![
        sym!("floorf", shim_floorf),
        sym!("ceilf", shim_ceilf),
        sym!("truncf", shim_truncf),
        sym!("nearbyintf", shim_nearbyintf),
        sym!("sinf", shim_sinf),
        sym!("cosf", shim_cosf),
        sym!("tanf", shim_tanf),
        sym!("powf", shim_powf),
        sym!("expf", shim_expf),
        sym!("exp2f", shim_exp2f),
        sym!("logf", shim_logf),
        sym!("log2f", shim_log2f),
        sym!("sqrtf", shim_sqrtf),
        sym!("floor", shim_floor),
        sym!("ceil", shim_ceil),
        sym!("trunc", shim_trunc),
        sym!("nearbyint", shim_nearbyint),
        sym!("sin", shim_sin),
        sym!("cos", shim_cos),
        sym!("pow", shim_pow),
        sym!("exp", shim_exp),
        sym!("log", shim_log),
        sym!("sqrt", shim_sqrt),
    ]
}

pub fn resolve(name: &str) -> Option<*const ()> {
    whitelist().into_iter().find(|s| s.name == name).map(|s| s.addr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_symbol() {
        assert!(resolve("sqrtf").is_some());
    }

    #[test]
    fn unknown_symbol_does_not_resolve() {
        assert!(resolve("system").is_none());
    }
}
