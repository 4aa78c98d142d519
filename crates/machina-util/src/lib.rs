// dense index newtypes; the automaton model keeps caller-chosen state ids,
// the algorithms work over indices 0..n so that BitSet and Vec lookups stay O(1)
#[macro_export]
macro_rules! make_type_idx {
    ($type_idx_name:tt, $type_name:tt) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub(crate) struct $type_idx_name(u32);

        #[allow(dead_code)]
        impl $type_idx_name {
            pub(crate) fn new(index: usize) -> $type_idx_name {
                $type_idx_name(index as u32)
            }

            pub(crate) fn value(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_push(vec: &mut Vec<$type_name>, val: $type_name) -> $type_idx_name {
                let idx = $type_idx_name(vec.len() as u32);
                vec.push(val);
                idx
            }
        }

        impl std::ops::Index<$type_idx_name> for [$type_name] {
            type Output = $type_name;

            fn index(&self, index: $type_idx_name) -> &Self::Output {
                &self[index.0 as usize]
            }
        }

        impl std::ops::IndexMut<$type_idx_name> for [$type_name] {
            fn index_mut(&mut self, index: $type_idx_name) -> &mut Self::Output {
                &mut self[index.0 as usize]
            }
        }

        impl std::ops::Index<$type_idx_name> for Vec<$type_name> {
            type Output = $type_name;

            fn index(&self, index: $type_idx_name) -> &Self::Output {
                <[$type_name] as std::ops::Index<$type_idx_name>>::index(self.as_slice(), index)
            }
        }

        impl std::ops::IndexMut<$type_idx_name> for Vec<$type_name> {
            fn index_mut(&mut self, index: $type_idx_name) -> &mut Self::Output {
                <[$type_name] as std::ops::IndexMut<$type_idx_name>>::index_mut(self.as_mut_slice(), index)
            }
        }
    };
}

/// Position of the `n`-th item on a grid with `columns` cells per row, used to
/// lay out synthesized states so an editor can show them without overlap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Grid {
    pub columns: u32,
    pub origin: (f64, f64),
    pub spacing: f64,
}

impl Grid {
    pub const fn new(columns: u32, origin: (f64, f64), spacing: f64) -> Grid {
        Grid { columns, origin, spacing }
    }

    pub fn place(&self, n: u32) -> (f64, f64) {
        let column = (n % self.columns) as f64;
        let row = (n / self.columns) as f64;
        (self.origin.0 + column * self.spacing, self.origin.1 + row * self.spacing)
    }
}
