//! Channel signatures
//!
//! A channel is parameterized by a tuple of argument types: `()` for a channel
//! that carries nothing, `(u32,)` for one argument, `(String, i64)` for two, and
//! so on up to eight. [`Callback`] and [`MethodCallback`] connect such a tuple to
//! the functions and methods that accept its elements.
//!
//! Each listener receives its own clone of every argument, so all element types
//! must be `Clone`.

mod sealed {
    pub trait Sealed {}
}

/// Argument list of a channel, expressed as a tuple
///
/// Implemented for tuples of zero to eight `Clone + 'static` elements. This
/// trait is sealed.
pub trait Arguments: sealed::Sealed + 'static {}

/// Marker for argument lists with at least one element
///
/// Only channels whose signature carries arguments offer the ignore-args
/// subscriptions; on an `EventChannel<()>` they would duplicate the plain ones.
pub trait NonEmpty: Arguments {}

/// A free function (or closure) accepting the arguments `A`
///
/// Implemented for every `Fn` whose parameters match the tuple, e.g.
/// `fn on_reading(source: String, value: i64)` for `(String, i64)`.
pub trait Callback<A: Arguments>: 'static {
    /// Call with a clone of each argument
    fn invoke(&self, args: &A);
}

/// A method on `T` accepting the arguments `A`
///
/// Implemented for every `Fn(&T, ..)` whose remaining parameters match the
/// tuple, e.g. `Gauge::on_reading(&self, source: String, value: i64)`.
pub trait MethodCallback<T, A: Arguments>: 'static {
    /// Call on `target` with a clone of each argument
    fn invoke(&self, target: &T, args: &A);
}

macro_rules! impl_arguments {
    ($($ty:ident $arg:ident),*) => {
        impl<$($ty: Clone + 'static),*> sealed::Sealed for ($($ty,)*) {}

        impl<$($ty: Clone + 'static),*> Arguments for ($($ty,)*) {}

        impl<Func, $($ty: Clone + 'static),*> Callback<($($ty,)*)> for Func
        where
            Func: Fn($($ty),*) + 'static,
        {
            fn invoke(&self, args: &($($ty,)*)) {
                let ($($arg,)*) = args;
                self($($arg.clone()),*);
            }
        }

        impl<Func, Target, $($ty: Clone + 'static),*> MethodCallback<Target, ($($ty,)*)> for Func
        where
            Func: Fn(&Target $(, $ty)*) + 'static,
        {
            fn invoke(&self, target: &Target, args: &($($ty,)*)) {
                let ($($arg,)*) = args;
                self(target $(, $arg.clone())*);
            }
        }
    };
}

macro_rules! impl_non_empty {
    ($($ty:ident),+) => {
        impl<$($ty: Clone + 'static),+> NonEmpty for ($($ty,)+) {}
    };
}

impl_arguments!();
impl_arguments!(A a);
impl_arguments!(A a, B b);
impl_arguments!(A a, B b, C c);
impl_arguments!(A a, B b, C c, D d);
impl_arguments!(A a, B b, C c, D d, E e);
impl_arguments!(A a, B b, C c, D d, E e, F f);
impl_arguments!(A a, B b, C c, D d, E e, F f, G g);
impl_arguments!(A a, B b, C c, D d, E e, F f, G g, H h);

impl_non_empty!(A);
impl_non_empty!(A, B);
impl_non_empty!(A, B, C);
impl_non_empty!(A, B, C, D);
impl_non_empty!(A, B, C, D, E);
impl_non_empty!(A, B, C, D, E, F);
impl_non_empty!(A, B, C, D, E, F, G);
impl_non_empty!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    thread_local! {
        static LAST_SUM: Cell<i64> = const { Cell::new(0) };
    }

    fn add(a: i64, b: i64) {
        LAST_SUM.with(|sum| sum.set(a + b));
    }

    struct Acc {
        total: Cell<i64>,
    }

    impl Acc {
        fn push(&self, value: i64) {
            self.total.set(self.total.get() + value);
        }

        fn reset(&self) {
            self.total.set(0);
        }
    }

    #[test]
    fn test_invoke_clones_arguments() {
        Callback::<(i64, i64)>::invoke(&add, &(2, 3));
        assert_eq!(LAST_SUM.with(Cell::get), 5);
    }

    #[test]
    fn test_invoke_method() {
        let acc = Acc {
            total: Cell::new(1),
        };
        MethodCallback::<Acc, (i64,)>::invoke(&Acc::push, &acc, &(41,));
        assert_eq!(acc.total.get(), 42);

        MethodCallback::<Acc, ()>::invoke(&Acc::reset, &acc, &());
        assert_eq!(acc.total.get(), 0);
    }
}
