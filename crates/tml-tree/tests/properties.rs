//! Property-based tests for the position tree
//!
//! Every operation is mirrored on a naive `Vec` of units and the two are
//! compared through the public query surface:
//!  - sizes under every color subset
//!  - `get` color/value for every unit
//!  - `convert_index_color` between the target and source spaces
//!  - runs are maximal (no two adjacent runs share color and value)

use proptest::prelude::*;
use tml_tree::{Color, ColorSet, PositionTree};

#[derive(Clone, Debug)]
enum Op {
    Add { index: usize, colors: u8, color: u8, value: u8, length: usize },
    Remove { index: usize, colors: u8, length: usize },
    Set { index: usize, colors: u8, color: u8, value: u8, length: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<usize>(), 1u8..16, 0u8..4, 0u8..3, 1usize..5).prop_map(
            |(index, colors, color, value, length)| Op::Add { index, colors, color, value, length }
        ),
        (any::<usize>(), 1u8..16, 1usize..4)
            .prop_map(|(index, colors, length)| Op::Remove { index, colors, length }),
        (any::<usize>(), 1u8..16, 0u8..4, 0u8..3, 1usize..4).prop_map(
            |(index, colors, color, value, length)| Op::Set { index, colors, color, value, length }
        ),
    ]
}

fn color_set(mask: u8) -> ColorSet {
    let colors: Vec<Color> = Color::ALL
        .iter()
        .copied()
        .filter(|c| mask & (1 << c.index()) != 0)
        .collect();
    ColorSet::of(&colors)
}

struct Model {
    units: Vec<(Color, u8)>,
}

impl Model {
    fn size(&self, colors: ColorSet) -> usize {
        self.units.iter().filter(|(c, _)| colors.contains(*c)).count()
    }

    /// Absolute position of the `index`-th unit of `colors`.
    fn position(&self, index: usize, colors: ColorSet) -> Option<usize> {
        self.units
            .iter()
            .enumerate()
            .filter(|(_, (c, _))| colors.contains(*c))
            .nth(index)
            .map(|(position, _)| position)
    }

    fn count_before(&self, position: usize, colors: ColorSet) -> usize {
        self.units[..position]
            .iter()
            .filter(|(c, _)| colors.contains(*c))
            .count()
    }

    fn runs(&self) -> usize {
        let mut runs = 0;
        let mut previous = None;
        for unit in &self.units {
            if previous != Some(unit) {
                runs += 1;
            }
            previous = Some(unit);
        }
        runs
    }
}

fn apply(tree: &mut PositionTree<u8>, model: &mut Model, op: Op) {
    match op {
        Op::Add { index, colors, color, value, length } => {
            let colors = color_set(colors);
            let index = index % (model.size(colors) + 1);
            let color = Color::ALL[color as usize];
            let position = if index == model.size(colors) {
                model.units.len()
            } else {
                model.position(index, colors).unwrap()
            };
            tree.add(index, colors, color, value, length).unwrap();
            for _ in 0..length {
                model.units.insert(position, (color, value));
            }
        }
        Op::Remove { index, colors, length } => {
            let colors = color_set(colors);
            let size = model.size(colors);
            if size == 0 {
                assert!(tree.remove(0, colors, length).is_err());
                return;
            }
            let index = index % size;
            let position = model.position(index, colors).unwrap();
            if position + length > model.units.len() {
                assert!(tree.remove(index, colors, length).is_err());
                return;
            }
            tree.remove(index, colors, length).unwrap();
            model.units.drain(position..position + length);
        }
        Op::Set { index, colors, color, value, length } => {
            let colors = color_set(colors);
            let size = model.size(colors);
            if size == 0 {
                return;
            }
            let index = index % size;
            let color = Color::ALL[color as usize];
            let position = model.position(index, colors).unwrap();
            if position + length > model.units.len() {
                assert!(tree.set(index, colors, color, value, length).is_err());
                return;
            }
            let total = tree.len();
            tree.set(index, colors, color, value, length).unwrap();
            assert_eq!(tree.len(), total);
            for unit in &mut model.units[position..position + length] {
                *unit = (color, value);
            }
        }
    }
}

proptest! {
    #[test]
    fn tree_matches_naive_model(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut tree = PositionTree::new();
        let mut model = Model { units: Vec::new() };
        for op in ops {
            apply(&mut tree, &mut model, op);
        }

        prop_assert_eq!(tree.len(), model.units.len());
        for mask in 1u8..16 {
            let colors = color_set(mask);
            prop_assert_eq!(tree.size(colors), model.size(colors));
        }
        for (position, (color, value)) in model.units.iter().enumerate() {
            let element = tree.get(position, ColorSet::ALL).unwrap();
            prop_assert_eq!(element.color(), *color);
            prop_assert_eq!(element.value(), value);
        }
        prop_assert_eq!(tree.node_count(), model.runs());
    }

    #[test]
    fn convert_index_color_matches_model(ops in prop::collection::vec(op_strategy(), 1..40)) {
        let mut tree = PositionTree::new();
        let mut model = Model { units: Vec::new() };
        for op in ops {
            apply(&mut tree, &mut model, op);
        }

        for (from, to) in [(ColorSet::TARGET, ColorSet::SOURCE), (ColorSet::SOURCE, ColorSet::TARGET)] {
            let size = model.size(from);
            for index in 0..size {
                let position = model.position(index, from).unwrap();
                prop_assert_eq!(
                    tree.convert_index_color(index, from, to).unwrap(),
                    model.count_before(position, to)
                );
            }
            prop_assert_eq!(tree.convert_index_color(size, from, to).unwrap(), model.size(to));
            prop_assert!(tree.convert_index_color(size + 1, from, to).is_err());
        }
    }

    #[test]
    fn cursor_visits_every_unit_in_order(ops in prop::collection::vec(op_strategy(), 1..40), mask in 1u8..16) {
        let mut tree = PositionTree::new();
        let mut model = Model { units: Vec::new() };
        for op in ops {
            apply(&mut tree, &mut model, op);
        }

        let colors = color_set(mask);
        let expected: Vec<(Color, u8)> = model
            .units
            .iter()
            .copied()
            .filter(|(c, _)| colors.contains(*c))
            .collect();

        let mut visited = Vec::new();
        let mut cursor = tree.cursor(colors);
        while cursor.next() {
            visited.push((cursor.color().unwrap(), *cursor.value().unwrap()));
        }
        prop_assert_eq!(visited, expected.clone());

        let mut by_runs = 0;
        let mut cursor = tree.cursor(colors);
        while cursor.next_node() {
            by_runs += cursor.run_remaining();
        }
        prop_assert_eq!(by_runs, expected.len());
    }
}
