/// Code samples for every supported language
pub mod code_samples {
    pub const RHAI_ECHO: &str = r#"let name = readline();
let count = input();
print(`${name} has ${count + 1} messages`);"#;

    pub const PYTHON_GREETER: &str = r#"name = input("What is your name? ")
age = int(input("How old are you? "))
print("Hello,", name)
print("Next year you will be", age + 1)
"#;

    pub const PYTHON_UNBALANCED: &str = r#"print("start")
values = [1, 2, 3
print("end")
"#;

    pub const JAVA_HELLO: &str = r#"public class Main {
    public static void main(String[] args) {
        System.out.println("Hello from Java!");
    }
}
"#;

    pub const CPP_SUM: &str = r#"#include <iostream>
using namespace std;

int main() {
    int a, b;
    cin >> a >> b;
    cout << "Sum: " << a + b << endl;
    return 0;
}
"#;

    pub const CSHARP_GREETER: &str = r#"using System;

class Program
{
    static void Main()
    {
        string name = Console.ReadLine();
        int age = int.Parse(Console.ReadLine());
        Console.WriteLine($"Hello, {name}! Next year you will be {age + 1}.");
    }
}
"#;
}
