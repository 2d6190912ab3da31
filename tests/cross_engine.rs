use intrusive_bst::order::KeyExtractor;
use intrusive_bst::{AvlLink, AvlTree, InsertCheck, Linked, RbLink, RbTree};
use rand::Rng;

const NUM_OF_OPERATIONS: usize = 5_000;

// One entry resident in both engines at once.
struct Session {
    id: u64,
    red_black_link: RbLink<usize>,
    avl_link: AvlLink<usize>,
}

impl Linked<RbLink<usize>> for Session {
    fn link(&self) -> &RbLink<usize> {
        &self.red_black_link
    }

    fn link_mut(&mut self) -> &mut RbLink<usize> {
        &mut self.red_black_link
    }
}

impl Linked<AvlLink<usize>> for Session {
    fn link(&self) -> &AvlLink<usize> {
        &self.avl_link
    }

    fn link_mut(&mut self) -> &mut AvlLink<usize> {
        &mut self.avl_link
    }
}

struct ById;

impl KeyExtractor<Session> for ById {
    type Key = u64;

    fn key(session: &Session) -> &u64 {
        &session.id
    }
}

fn session(id: u64) -> Session {
    Session {
        id,
        red_black_link: RbLink::new(),
        avl_link: AvlLink::new(),
    }
}

#[test]
fn int_test_same_script_same_order() {
    let mut rng: rand::XorShiftRng = rand::SeedableRng::from_seed([1, 1, 1, 1]);
    let mut sessions: Vec<Session> = Vec::new();
    let mut red_black: RbTree<usize, ById> = RbTree::new();
    let mut avl: AvlTree<usize, ById> = AvlTree::new();

    for _ in 0..NUM_OF_OPERATIONS {
        let id = rng.gen_range(0, 1024);
        let op = rng.gen_range(0, 4);
        if op == 0 {
            let red_black_node = red_black.remove(&mut sessions, &id);
            let avl_node = avl.remove(&mut sessions, &id);
            assert_eq!(red_black_node, avl_node);
        } else if op == 1 {
            assert_eq!(red_black.search(&sessions, &id), avl.search(&sessions, &id));
            assert_eq!(red_black.floor(&sessions, &id), avl.floor(&sessions, &id));
            assert_eq!(red_black.ceil(&sessions, &id), avl.ceil(&sessions, &id));
        } else {
            let red_black_check = red_black.insert_check(&sessions, &id);
            let avl_check = avl.insert_check(&sessions, &id);
            match (red_black_check, avl_check) {
                (InsertCheck::Vacant(red_black_context), InsertCheck::Vacant(avl_context)) => {
                    sessions.push(session(id));
                    let node = sessions.len() - 1;
                    red_black.insert_commit(&mut sessions, red_black_context, node);
                    avl.insert_commit(&mut sessions, avl_context, node);
                },
                (InsertCheck::Occupied(red_black_node), InsertCheck::Occupied(avl_node)) => {
                    assert_eq!(red_black_node, avl_node);
                },
                _ => panic!("Expected both engines to agree on residency."),
            }
        }

        assert_eq!(red_black.len(), avl.len());
    }

    assert_eq!(red_black.verify_invariants(&sessions), Ok(()));
    assert_eq!(avl.verify_invariants(&sessions), Ok(()));
    assert_eq!(
        red_black.iter(&sessions).collect::<Vec<usize>>(),
        avl.iter(&sessions).collect::<Vec<usize>>(),
    );
    assert_eq!(red_black.first(), avl.first(&sessions));
    assert_eq!(red_black.last(), avl.last(&sessions));
}

#[test]
fn int_test_remove_from_one_engine_only() {
    let mut sessions: Vec<Session> = (0..64).map(session).collect();
    let mut red_black: RbTree<usize, ById> = RbTree::new();
    let mut avl: AvlTree<usize, ById> = AvlTree::new();
    for node in 0..sessions.len() {
        red_black.insert(&mut sessions, node).unwrap();
        avl.insert(&mut sessions, node).unwrap();
    }

    for node in (0..64).filter(|node| node % 3 == 0) {
        red_black.remove_node(&mut sessions, node);
    }

    assert_eq!(red_black.verify_invariants(&sessions), Ok(()));
    assert_eq!(avl.verify_invariants(&sessions), Ok(()));
    assert_eq!(red_black.len(), 64 - 22);
    assert_eq!(avl.len(), 64);
    assert_eq!(avl.iter(&sessions).collect::<Vec<usize>>(), (0..64).collect::<Vec<usize>>());
}
