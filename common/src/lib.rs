pub mod generic_ring_buffer{

    use borsh::{BorshDeserialize, BorshSerialize};

    pub trait Identifier<T>{
        fn id(&self) -> T;
    }

    pub trait RingBuffer<TID: PartialEq, T: Clone + Identifier<TID>>{
        /// index the next added element will occupy
        fn next_index(&self) -> u32;
        /// adds element to the buffer, evicting the oldest one when full
        fn add(&mut self, element: &T);
        /// return the element at index
        fn get_by_index(&self, idx: u32) -> Option<T>;
        /// return the element with the given id, if it is still buffered
        fn get_by_identifier(&self, id: TID) -> Option<T>;
        fn len(&self) -> u32;
        fn is_empty(&self) -> bool;
    }

    #[derive(BorshSerialize, BorshDeserialize)]
    pub struct GenericRingBuffer<T, const CAPACITY: usize>{
        pub values: Vec<T>,
        next: u32,
    }

    impl<T, const CAPACITY: usize> Default for GenericRingBuffer<T, CAPACITY>{
        fn default() -> Self {
            assert_ne!(CAPACITY, 0, "capacity cannot be lower than 1");

            return Self { values: Vec::new(), next: 0 };
        }
    }

    impl<T, const CAPACITY: usize> GenericRingBuffer<T, CAPACITY>{
        pub fn new() -> Self{
            Self::default()
        }
    }

    impl<TID: PartialEq, T: Clone + Identifier<TID>, const CAPACITY: usize> RingBuffer<TID, T> for GenericRingBuffer<T, CAPACITY>{
        fn next_index(&self) -> u32{
            return self.next;
        }

        fn add(&mut self, element: &T){
            if self.values.len() < CAPACITY{
                self.values.push(element.clone());
            }else{
                self.values[self.next as usize] = element.clone();
            }

            self.next = (self.next + 1) % CAPACITY as u32;
        }

        fn get_by_index(&self, idx: u32) -> Option<T>{
            self.values.get(idx as usize).cloned()
        }

        fn get_by_identifier(&self, id: TID) -> Option<T> {
            return self.values
                        .iter()
                        .find(|el| el.id() == id)
                        .cloned();
        }

        fn len(&self) -> u32{
            self.values.len() as u32
        }

        fn is_empty(&self) -> bool{
            self.values.is_empty()
        }
    }
}

pub mod types;
