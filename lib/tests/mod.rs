use crate::analysis::fixed_point::{FixpointTransformer, MonotonicFixpointIterator};
use crate::analysis::type_check::{
    type_check, type_check_with, AbstractEnvironment, PointerClass, PointerNumberDomain,
    TypeCheckAnalysis,
};
use crate::analysis::{
    AbstractDomain, ConstantDomain, Environment, FixpointOptionsBuilder, Left, Right,
    WorklistOrder,
};
use crate::graph::Reversed;
use crate::il::{Class, Mnemonic, Program};
use crate::Error;
use std::cell::RefCell;

fn number() -> PointerNumberDomain {
    PointerNumberDomain::number(0)
}

fn pointer() -> PointerNumberDomain {
    PointerNumberDomain::pointer(PointerClass::new(1))
}

#[test]
fn single_block() {
    let mut program = Program::new();
    let index = {
        let block = program.create_block().unwrap();
        block.assign("x", Class::Number);
        block.assign("y", Class::Pointer);
        block.add("x", "z");
        block.index()
    };
    program.set_entry(index).unwrap();

    let states = type_check(&program).unwrap();
    let exit = states.exit(index).unwrap();

    assert_eq!(exit.get("x"), number());
    assert_eq!(exit.get("y"), pointer());
    assert_eq!(exit.get("z"), number());
    assert!(exit.get("w").is_bottom());
    assert_eq!(states.entry(index).unwrap(), &AbstractEnvironment::new());
    assert_eq!(states.iterations(), 1);
}

#[test]
fn single_block_from_top() {
    let mut program = Program::new();
    let index = {
        let block = program.create_block().unwrap();
        block.assign("x", Class::Number);
        block.assign("y", Class::Pointer);
        block.add("x", "z");
        block.index()
    };
    program.set_entry(index).unwrap();

    let states =
        type_check_with(&program, AbstractEnvironment::top(), Default::default()).unwrap();
    let exit = states.exit(index).unwrap();

    assert_eq!(exit.get("x"), number());
    assert_eq!(exit.get("y"), pointer());
    assert_eq!(exit.get("z"), number());
    assert!(exit.get("w").is_top());
    assert!(states.entry(index).unwrap().is_top());
}

#[test]
fn conflicting_predecessors_join_to_top() {
    let mut program = Program::new();
    let entry = program.create_block().unwrap().index();
    let left = {
        let block = program.create_block().unwrap();
        block.assign("x", Class::Number);
        block.assign("n", Class::Number);
        block.index()
    };
    let right = {
        let block = program.create_block().unwrap();
        block.assign("x", Class::Pointer);
        block.assign("n", Class::Number);
        block.index()
    };
    let merge = {
        let block = program.create_block().unwrap();
        block.add("x", "y");
        block.index()
    };
    program.add_successor(entry, left).unwrap();
    program.add_successor(entry, right).unwrap();
    program.add_successor(left, merge).unwrap();
    program.add_successor(right, merge).unwrap();
    program.set_entry(entry).unwrap();

    let states = type_check(&program).unwrap();

    assert_eq!(states.exit(left).unwrap().get("x"), number());
    assert_eq!(states.exit(right).unwrap().get("x"), pointer());

    let merged = states.entry(merge).unwrap();
    assert!(merged.get("x").is_top());
    assert_eq!(merged.get("n"), number());
    assert!(states.exit(merge).unwrap().get("y").is_top());
}

#[test]
fn self_loop_converges() {
    let mut program = Program::new();
    let index = {
        let block = program.create_block().unwrap();
        block.assign("x", Class::Number);
        block.add("x", "x");
        block.index()
    };
    program.add_successor(index, index).unwrap();
    program.set_entry(index).unwrap();

    let states = type_check(&program).unwrap();

    assert_eq!(states.exit(index).unwrap().get("x"), number());
    assert_eq!(states.entry(index).unwrap().get("x"), number());
    // The third visit adds nothing to the entry state.
    assert_eq!(states.iterations(), 3);
}

#[test]
fn loop_carried_value_goes_to_top() {
    // 0: p = pointer
    // 1: q = p; p = number      (loops back to itself)
    let mut program = Program::new();
    let head = {
        let block = program.create_block().unwrap();
        block.assign("p", Class::Pointer);
        block.index()
    };
    let body = {
        let block = program.create_block().unwrap();
        block.add("p", "q");
        block.assign("p", Class::Number);
        block.index()
    };
    program.add_successor(head, body).unwrap();
    program.add_successor(body, body).unwrap();
    program.set_entry(head).unwrap();

    let states = type_check(&program).unwrap();
    let entry = states.entry(body).unwrap();

    assert!(entry.get("p").is_top());
    assert!(entry.get("q").is_top());
    assert!(states.exit(body).unwrap().get("q").is_top());
    assert_eq!(states.exit(body).unwrap().get("p"), number());
}

#[test]
fn sides_of_the_union() {
    let top = PointerNumberDomain::top();
    let number = PointerNumberDomain::number(7);

    assert_eq!(top.maybe_get::<Left>(), None);
    assert_eq!(top.maybe_get::<Right>(), None);
    assert_eq!(number.maybe_get::<Left>(), Some(&ConstantDomain::value(7)));
    assert_eq!(number.maybe_get::<Right>(), None);
    assert_eq!(number.class(), Some(Class::Number));
    assert_eq!(pointer().class(), Some(Class::Pointer));

    assert_eq!(number.number_value(), Some(7));
    assert_eq!(number.pointer_value(), None);
    assert_eq!(pointer().pointer_value(), Some(PointerClass::new(1)));
    assert_eq!(top.number_value(), None);
}

#[test]
fn unsupported_mnemonic_fails_analysis() {
    let mut program = Program::new();
    let entry = {
        let block = program.create_block().unwrap();
        block.assign("x", Class::Number);
        block.index()
    };
    let bad = {
        let block = program.create_block().unwrap();
        block.push(Mnemonic::unsupported("call"));
        block.index()
    };
    program.add_successor(entry, bad).unwrap();
    program.set_entry(entry).unwrap();

    match type_check(&program) {
        Err(Error::UnreachableInstruction(opcode)) => assert_eq!(opcode, "call"),
        other => panic!("expected UnreachableInstruction, got {:?}", other),
    }
}

#[test]
fn unreachable_blocks_are_bottom() {
    let mut program = Program::new();
    let entry = {
        let block = program.create_block().unwrap();
        block.assign("x", Class::Number);
        block.index()
    };
    let orphan = {
        let block = program.create_block().unwrap();
        block.assign("x", Class::Pointer);
        block.index()
    };
    program.add_successor(orphan, entry).unwrap();
    program.set_entry(entry).unwrap();

    let states = type_check(&program).unwrap();

    assert!(states.entry(orphan).unwrap().is_bottom());
    assert!(states.exit(orphan).unwrap().is_bottom());
    assert_eq!(states.exit(entry).unwrap().get("x"), number());
    assert_eq!(states.blocks(), vec![entry, orphan]);
    assert!(states.entry(orphan + 1).is_err());
}

#[test]
fn missing_entry_fails_analysis() {
    let mut program = Program::new();
    program.create_block().unwrap();

    assert!(matches!(type_check(&program), Err(Error::EntryNotSet)));
}

#[test]
fn initial_environment_reaches_entry() {
    let mut program = Program::new();
    let index = {
        let block = program.create_block().unwrap();
        block.add("argument", "local");
        block.index()
    };
    program.set_entry(index).unwrap();

    let initial = AbstractEnvironment::new().set("argument".to_string(), pointer());
    let states = type_check_with(&program, initial, Default::default()).unwrap();

    assert_eq!(states.exit(index).unwrap().get("local"), pointer());
}

/// 0 -> 1 -> 2 -> 1, 2 -> 3, with 1 and 2 disagreeing about `x`.
fn nested_program() -> Program {
    let mut program = Program::new();
    let b0 = {
        let block = program.create_block().unwrap();
        block.assign("x", Class::Number);
        block.assign("y", Class::Pointer);
        block.index()
    };
    let b1 = {
        let block = program.create_block().unwrap();
        block.add("x", "z");
        block.index()
    };
    let b2 = {
        let block = program.create_block().unwrap();
        block.assign("x", Class::Pointer);
        block.index()
    };
    let b3 = {
        let block = program.create_block().unwrap();
        block.add("y", "w");
        block.index()
    };
    program.add_successor(b0, b1).unwrap();
    program.add_successor(b1, b2).unwrap();
    program.add_successor(b2, b1).unwrap();
    program.add_successor(b2, b3).unwrap();
    program.set_entry(b0).unwrap();
    program.set_exit(b3).unwrap();
    program
}

#[test]
fn analysis_is_deterministic() {
    let program = nested_program();

    let first = type_check(&program).unwrap();
    let second = type_check(&program).unwrap();
    assert_eq!(first, second);

    let fifo = FixpointOptionsBuilder::new()
        .order(WorklistOrder::Fifo)
        .build();
    let third = type_check_with(&program, AbstractEnvironment::new(), fifo).unwrap();
    for block in first.blocks() {
        assert_eq!(first.entry(block).unwrap(), third.entry(block).unwrap());
        assert_eq!(first.exit(block).unwrap(), third.exit(block).unwrap());
    }

    assert!(first.exit(1).unwrap().get("z").is_top());
    assert_eq!(first.exit(3).unwrap().get("x"), pointer());
    assert_eq!(first.exit(3).unwrap().get("w"), pointer());
}

/// Runs the type check, keeping every state seen on entry to and exit from
/// each block.
struct Recording<'p> {
    analysis: TypeCheckAnalysis<'p>,
    visits: RefCell<Vec<(usize, AbstractEnvironment, AbstractEnvironment)>>,
}

impl FixpointTransformer<Program, AbstractEnvironment> for Recording<'_> {
    fn analyze_node(&self, node: usize, state: &mut AbstractEnvironment) -> Result<(), Error> {
        let entry = state.clone();
        self.analysis.analyze_node(node, state)?;
        self.visits
            .borrow_mut()
            .push((node, entry, state.clone()));
        Ok(())
    }
}

#[test]
fn states_only_grow() {
    let program = nested_program();
    let recording = Recording {
        analysis: TypeCheckAnalysis::new(&program),
        visits: RefCell::new(Vec::new()),
    };

    let mut iterator: MonotonicFixpointIterator<Program, AbstractEnvironment, Recording> =
        MonotonicFixpointIterator::new(&program, recording);
    iterator.run(AbstractEnvironment::new()).unwrap();

    let visits = iterator.transformer().visits.borrow();
    let mut revisited = false;
    for block in program.blocks() {
        let states = visits
            .iter()
            .filter(|(node, _, _)| *node == block.index())
            .collect::<Vec<_>>();
        for pair in states.windows(2) {
            let (_, entry, exit) = pair[0];
            let (_, next_entry, next_exit) = pair[1];
            assert!(entry.leq(next_entry), "{} !<= {}", entry, next_entry);
            assert!(exit.leq(next_exit), "{} !<= {}", exit, next_exit);
            revisited = true;
        }
        if let Some((_, entry, exit)) = states.last() {
            assert_eq!(*entry, iterator.entry_state_at(block.index()));
            assert_eq!(*exit, iterator.exit_state_at(block.index()));
        }
    }
    assert!(revisited);
}

#[test]
fn fixed_point_covers_every_edge() {
    let program = nested_program();
    let states = type_check(&program).unwrap();

    // Every edge carries at most what its target has on entry.
    for edge in program.edges() {
        let flowing = states.exit(edge.head()).unwrap();
        let entry = states.entry(edge.tail()).unwrap();
        assert!(flowing.leq(entry), "{} !<= {}", flowing, entry);
    }

    assert!(states.iterations() <= 8);
    let limited = FixpointOptionsBuilder::new().iteration_limit(2).build();
    assert!(matches!(
        type_check_with(&program, AbstractEnvironment::new(), limited),
        Err(Error::IterationLimit(2))
    ));
}

#[test]
fn program_from_json() {
    let mnemonics: Vec<Mnemonic> = serde_json::from_str(
        r#"[
            {"Assignment": {"variable": "base", "class": "Pointer"}},
            {"Assignment": {"variable": "offset", "class": "Number"}},
            {"Add": {"src": "base", "dest": "cursor"}}
        ]"#,
    )
    .unwrap();

    let mut program = Program::new();
    let index = {
        let block = program.create_block().unwrap();
        for mnemonic in mnemonics {
            block.push(mnemonic);
        }
        block.index()
    };
    program.set_entry(index).unwrap();

    let states = type_check(&program).unwrap();
    let exit = states.exit(index).unwrap();
    assert_eq!(exit.get("cursor"), pointer());
    assert_eq!(exit.get("offset"), number());

    let json = serde_json::to_string(&states).unwrap();
    assert_eq!(
        serde_json::from_str::<crate::analysis::TypeStates>(&json).unwrap(),
        states
    );
}

type Definitions = Environment<String, ConstantDomain<usize>>;

/// Binds every variable to the nearest block, at or after the current
/// block, which writes it.
struct NextDefinition<'p> {
    program: &'p Program,
}

impl<'g> FixpointTransformer<Reversed<'g, Program>, Definitions> for NextDefinition<'_> {
    fn analyze_node(&self, node: usize, state: &mut Definitions) -> Result<(), Error> {
        for mnemonic in self.program.block(node)?.mnemonics() {
            if let Some(variable) = mnemonic.variable_written() {
                state.set_mut(variable.to_string(), ConstantDomain::value(node));
            }
        }
        Ok(())
    }
}

#[test]
fn backward_analysis_over_reversed_program() {
    let mut program = Program::new();
    let first = {
        let block = program.create_block().unwrap();
        block.assign("x", Class::Number);
        block.index()
    };
    let second = {
        let block = program.create_block().unwrap();
        block.assign("y", Class::Number);
        block.index()
    };
    let last = {
        let block = program.create_block().unwrap();
        block.assign("x", Class::Pointer);
        block.index()
    };
    program.add_successor(first, second).unwrap();
    program.add_successor(second, last).unwrap();
    program.set_entry(first).unwrap();
    program.set_exit(last).unwrap();

    let reversed = Reversed::new(&program);
    let mut iterator: MonotonicFixpointIterator<Reversed<Program>, Definitions, NextDefinition> =
        MonotonicFixpointIterator::new(
            &reversed,
            NextDefinition { program: &program },
        );
    iterator.run(Definitions::new()).unwrap();

    let at_second = iterator.exit_state_at(second);
    assert_eq!(at_second.get("x"), ConstantDomain::value(last));
    assert_eq!(at_second.get("y"), ConstantDomain::value(second));

    let at_first = iterator.exit_state_at(first);
    assert_eq!(at_first.get("x"), ConstantDomain::value(first));
    assert_eq!(iterator.visited_nodes(), vec![first, second, last]);
}
