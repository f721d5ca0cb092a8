use std::cell::RefCell;

/// Settings read from the process environment once, at startup.
#[derive(Clone, Copy, Debug, Default)]
struct Env {
    /// `C8_HEADLESS=1`
    headless: bool,
    /// `C8_SEED=<u64>`
    seed: Option<u64>,
}

thread_local! {
    /// Must only be mutated within `init`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

pub fn init() {
    let value = Env {
        headless: std::env::var("C8_HEADLESS").is_ok_and(|value| value == "1"),
        seed: std::env::var("C8_SEED")
            .ok()
            .and_then(|value| value.trim().parse().ok()),
    };
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

/// Force the headless backend.
pub fn is_headless() -> bool {
    with_env(|env| env.headless)
}

/// Seed for `RND`, making runs reproducible.
pub fn seed() -> Option<u64> {
    with_env(|env| env.seed)
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}
